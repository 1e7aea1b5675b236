#![allow(clippy::unwrap_used)]

use feb::model::NodeTarget;
use feb::{BuildOptions, Category, FebError, Options};
use rstest::rstest;

use crate::helpers::document_fixtures::{PASSTHROUGH, REORDERED, TET4, TWO_FACE_SURFACE};
use crate::helpers::model_helpers::{
    assert_dangling, assert_duplicate, build_ok, build_str, build_with,
};

#[test]
fn test_domain_with_unknown_material_is_dangling() {
    let document = TET4.replace(r#"mat="Material1""#, r#"mat="Unobtainium""#);
    let result = build_str(&document);
    assert_dangling(result, Category::Material, "Unobtainium");

    let err = build_str(&document).unwrap_err();
    assert_eq!(err.locator.to_string(), "febio_spec/MeshDomains/SolidDomain[name=Part1]");
}

#[test]
fn test_domain_with_unknown_elements_group_is_dangling() {
    let document = TET4.replace(r#"<SolidDomain name="Part1""#, r#"<SolidDomain name="Part9""#);
    assert_dangling(build_str(&document), Category::ElementsGroup, "Part9");
}

#[test]
fn test_duplicate_material_names_with_differing_ids() {
    let second = r#"<material id="2" name="Material1" type="isotropic elastic">
			<E>1</E>
			<v>0.3</v>
		</material>
	</Material>"#;
    let document = TET4.replacen("</Material>", second, 1);
    let result = build_str(&document);
    assert_duplicate(result, Category::Material, "Material1");

    let err = build_str(&document).unwrap_err();
    assert_eq!(err.locator.to_string(), "febio_spec/Material/material[id=2]");
}

#[test]
fn test_qualified_surface_expands_to_unique_nodes() {
    let model = build_ok(TWO_FACE_SURFACE);
    let bc = &model.boundary_conditions[0];
    let surface = model.mesh.surfaces.iter().position(|s| s.name == "S").unwrap();

    match bc.target.as_ref().unwrap() {
        NodeTarget::Surface { surface: handle, nodes } => {
            assert_eq!(handle.index(), surface);
            assert_eq!(nodes, &[1, 2, 3, 4, 5]);
        }
        other => panic!("expected a surface target, got {other:?}"),
    }
}

#[test]
fn test_bare_node_set_name_does_not_match_surface() {
    let document = TWO_FACE_SURFACE.replace("@surface:S", "S");
    assert_dangling(build_str(&document), Category::NodeSet, "S");
}

#[test]
fn test_qualified_reference_to_missing_surface() {
    let document = TWO_FACE_SURFACE.replace("@surface:S", "@surface:Q");
    assert_dangling(build_str(&document), Category::Surface, "Q");
}

#[test]
fn test_unknown_load_controller_id_is_dangling() {
    let document = TET4.replace(r#"<pressure lc="1">"#, r#"<pressure lc="99">"#);
    let result = build_str(&document);
    assert_dangling(result, Category::LoadController, "99");

    let err = build_str(&document).unwrap_err();
    assert_eq!(
        err.locator.to_string(),
        "febio_spec/Loads/surface_load[name=PressureLoad1]"
    );
    assert_eq!(
        err.to_string(),
        "febio_spec/Loads/surface_load[name=PressureLoad1]: unresolved load controller reference '99'"
    );
}

#[test]
fn test_forward_references_resolve() {
    let model = build_ok(REORDERED);
    let load = &model.surface_loads[0];
    assert_eq!(model.surface(load.surface).unwrap().name, "Top");

    let controller = load.magnitude().unwrap().controller.unwrap();
    assert_eq!(model.load_controller(controller).unwrap().id, 4);

    let dtmax = model
        .control
        .as_ref()
        .and_then(|c| c.time_stepper.as_ref())
        .and_then(|t| t.dtmax.as_ref())
        .unwrap();
    assert_eq!(dtmax.scale, 0.1);
    assert_eq!(dtmax.controller, Some(controller));
}

#[test]
fn test_scoped_ids_allowed_by_default_and_flagged_in_strict_mode() {
    let second_group = r#"</Nodes>
		<Nodes name="Object2">
			<node id="4">5,5,5</node>
		</Nodes>"#;
    let document = TET4.replacen("</Nodes>", second_group, 1);
    assert!(build_str(&document).is_ok());

    let strict = Options {
        build: BuildOptions {
            strict_global_ids: true,
            ..BuildOptions::default()
        },
        ..Options::default()
    };
    let err = build_with(&document, strict).unwrap_err();
    assert_eq!(err.cause(), &FebError::duplicate(Category::Node, 4));
    assert_eq!(err.locator.to_string(), "febio_spec/Mesh/Nodes[name=Object2]/node[id=4]");
}

#[rstest]
#[case::material(Category::Material, "<Material>", "</Material>", r#"<material id="1" name="M" type="neo-Hookean"><E>1</E><v>0.3</v></material>"#)]
#[case::load_controller(Category::LoadController, "<LoadData>", "</LoadData>", r#"<load_controller id="1" type="loadcurve"><points><point>0,0</point><point>1,1</point></points></load_controller>"#)]
fn test_duplicate_ids(
    #[case] category: Category,
    #[case] open: &str,
    #[case] close: &str,
    #[case] entity: &str,
) {
    let section = format!("{open}{entity}{entity}{close}");
    let document = format!(
        r#"<febio_spec version="3.0">{}</febio_spec>"#,
        section.replacen(r#"name="M""#, r#"name="N""#, 1)
    );
    assert_duplicate(build_str(&document), category, "1");
}

#[test]
fn test_undefined_node_in_connectivity() {
    let document = TET4.replace("<elem id=\"1\">1,2,3,4</elem>", "<elem id=\"1\">1,2,3,8</elem>");
    let err = build_str(&document).unwrap_err();
    assert_eq!(err.cause(), &FebError::dangling(Category::Node, 8));
    assert_eq!(err.locator.to_string(), "febio_spec/Mesh/Elements[name=Part1]/elem[id=1]");

    let relaxed = Options {
        build: BuildOptions {
            check_node_references: false,
            ..BuildOptions::default()
        },
        ..Options::default()
    };
    assert!(build_with(&document, relaxed).is_ok());
}

#[test]
fn test_unknown_types_still_resolve_references() {
    let model = build_ok(PASSTHROUGH);
    let domain = &model.domains[0];
    assert_eq!(model.material(domain.material).unwrap().name, "Rubber");
    assert_eq!(model.elements_group(domain.elements).unwrap().name, "Block");

    let hinge = &model.boundary_conditions[0];
    match hinge.target.as_ref().unwrap() {
        NodeTarget::NodeSet(set) => assert_eq!(model.node_set(*set).unwrap().name, "Base"),
        other => panic!("expected a node set target, got {other:?}"),
    }
    assert!(model.boundary_conditions[1].target.is_none());
}
