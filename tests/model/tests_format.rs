#![allow(clippy::unwrap_used)]

use feb::codec::{AnalysisKind, ElementShape, FaceShape, Interpolation};
use feb::model::{
    BcType, BoundaryCondition, Control, DomainAssignment, DomainKind, Element, ElementsGroup, Face,
    LoadController, Material, MaterialType, Node, NodeTarget, NodesGroup, Surface, SurfaceLoad,
    SurfaceLoadType, TetMesh,
};
use feb::options::Indent;
use feb::{Category, Feb, FebError, FieldValue, Model, ModelFormat, Options, Params, Scaled, TypeRegistry};
use rstest::rstest;
use serde_json::json;

use crate::helpers::document_fixtures::{PASSTHROUGH, REORDERED, TET4, TWO_FACE_SURFACE};
use crate::helpers::model_helpers::build_ok;

fn programmatic_model() -> Model {
    let mut model = Model::new();
    model.control = Some(Control::new(AnalysisKind::Static, 5, 0.2));

    let rubber = model.add_material(
        Material::new(2, "Rubber", MaterialType::MooneyRivlin).with_params(
            Params::new()
                .with("c1", FieldValue::Real(1.0))
                .with("c2", FieldValue::Real(0.5))
                .with("k", FieldValue::Real(100.0)),
        ),
    );
    let ramp = model.add_load_controller(LoadController::curve(
        3,
        Interpolation::Linear,
        vec![[0.0, 0.0], [1.0, 1.0]],
    ));

    model.mesh.add_nodes(NodesGroup {
        name: "Nodes".to_string(),
        nodes: [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]
            .into_iter()
            .zip(1..)
            .map(|(position, id)| Node { id, position })
            .collect(),
    });
    let mut part = ElementsGroup::new("Body", ElementShape::Tet4);
    part.elements.push(Element {
        id: 1,
        nodes: vec![1, 2, 3, 4],
    });
    let body = model.mesh.add_elements(part);
    let base = model.mesh.add_surface(Surface {
        name: "Base".to_string(),
        faces: vec![Face {
            shape: FaceShape::Tri3,
            id: 1,
            nodes: vec![1, 3, 2],
        }],
    });

    model.domains.push(DomainAssignment {
        kind: DomainKind::Solid,
        elements: body,
        material: rubber,
        attributes: Vec::new(),
        children: Vec::new(),
    });
    model.boundary_conditions.push(BoundaryCondition {
        name: Some("Clamp".to_string()),
        kind: BcType::Fix,
        target: Some(NodeTarget::surface(&model.mesh, base).unwrap()),
        params: Params::new().with(
            "dofs",
            FieldValue::Tokens(vec!["x".to_string(), "y".to_string(), "z".to_string()]),
        ),
        attributes: Vec::new(),
    });
    model.surface_loads.push(SurfaceLoad {
        name: Some("Lift".to_string()),
        kind: SurfaceLoadType::Pressure,
        surface: base,
        params: Params::new().with("pressure", FieldValue::Scaled(Scaled::controlled(-0.5, ramp))),
        attributes: Vec::new(),
    });
    model
}

#[test]
fn test_programmatic_model_serializes_references() {
    let registry = TypeRegistry::febio();
    let feb = Feb::new(&registry);
    let model = programmatic_model();

    let text = feb.write_string(&model).unwrap();
    assert!(text.contains(r#"<SolidDomain name="Body" mat="Rubber"/>"#));
    assert!(text.contains(r#"node_set="@surface:Base""#));
    assert!(text.contains(r#"<pressure lc="3">-0.5</pressure>"#));
    assert!(text.contains(r#"<load_controller id="3" type="loadcurve">"#));

    let rebuilt = feb.read_str(&text).unwrap();
    assert_eq!(rebuilt.materials, model.materials);
    assert_eq!(rebuilt.boundary_conditions, model.boundary_conditions);
    assert_eq!(rebuilt.surface_loads, model.surface_loads);
    assert_eq!(rebuilt.load_controllers, model.load_controllers);
}

#[test]
fn test_programmatic_model_with_stale_handle_fails() {
    let registry = TypeRegistry::febio();
    let mut model = programmatic_model();
    model.load_controllers.clear();

    let err = Feb::new(&registry).write(&model).unwrap_err();
    assert!(matches!(
        err.cause(),
        FebError::DanglingReference { category: Category::LoadController, .. }
    ));
}

#[test]
fn test_bytes_round_trip() {
    let registry = TypeRegistry::febio();
    let feb = Feb::new(&registry);
    let model = feb.read(TET4.as_bytes()).unwrap();
    let bytes = feb.write(&model).unwrap();
    assert_eq!(feb.read(&bytes).unwrap(), model);
    assert!(feb.validate(&bytes).is_ok());
}

#[test]
fn test_read_many_keeps_input_order() {
    let registry = TypeRegistry::febio();
    let feb = Feb::new(&registry);
    let broken = TET4.replace(r#"lc="1""#, r#"lc="99""#);
    let inputs = [TET4, PASSTHROUGH, broken.as_str(), REORDERED, TWO_FACE_SURFACE];

    let results = feb.read_many(&inputs);
    assert_eq!(results.len(), inputs.len());
    assert_eq!(results[0].as_ref().unwrap(), &build_ok(TET4));
    assert_eq!(results[1].as_ref().unwrap().materials.len(), 2);
    assert_eq!(
        results[2].as_ref().unwrap_err().cause(),
        &FebError::dangling(Category::LoadController, 99)
    );
    assert!(results[3].is_ok());
    assert!(results[4].is_ok());
}

#[test]
fn test_options_from_json() {
    let options = Options::from_json(
        r#"{ "build": { "strict_global_ids": true }, "render": { "indent": "space", "indent_width": 2 } }"#,
    )
    .unwrap();
    assert!(options.build.strict_global_ids);
    assert!(options.build.check_node_references);
    assert_eq!(options.render.indent, Indent::Space);
    assert_eq!(options.render.encoding, "ISO-8859-1");

    let registry = TypeRegistry::febio();
    let feb = Feb::with_options(&registry, options);
    let text = feb.write_string(&build_ok(TWO_FACE_SURFACE)).unwrap();
    assert!(text.contains("\n  <Mesh>"));
    assert!(text.contains("\n    <Nodes name=\"N\">"));
}

#[rstest]
#[case::not_json("strict")]
#[case::wrong_type(r#"{ "build": { "strict_global_ids": "yes" } }"#)]
#[case::unknown_indent(r#"{ "render": { "indent": "tabs" } }"#)]
fn test_invalid_options_are_config_errors(#[case] text: &str) {
    assert!(matches!(Options::from_json(text), Err(FebError::Config(_))));
}

#[test]
fn test_tet_mesh_with_materials_from_field_maps() {
    let registry = TypeRegistry::febio();
    let fields = json!({
        "Wall": { "mat_type": "neo-Hookean", "id": 1, "E": 0.3, "v": 0.48 },
        "Plaque": { "mat_type": "Mooney-Rivlin", "id": 2, "c1": 1.0, "c2": 0.5, "k": 100.0 },
    });
    let materials = fields
        .as_object()
        .unwrap()
        .iter()
        .map(|(name, fields)| registry.material_from_map(name, fields.as_object().unwrap()))
        .collect::<Result<Vec<_>, _>>()
        .unwrap();

    let mut model = Model::new();
    model.control = Some(Control::new(AnalysisKind::Static, 25, 0.1));
    let mesh = TetMesh {
        vertices: vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [1.0, 1.0, 1.0],
        ],
        elements: vec![[0, 1, 2, 3], [1, 2, 3, 4]],
        element_materials: vec![1, 2],
    };
    model.add_tet_mesh(&mesh, materials).unwrap();

    let feb = Feb::new(&registry);
    let text = feb.write_string(&model).unwrap();
    assert!(text.contains(r#"<Elements type="tet4" name="Elements_Wall">"#));
    assert!(text.contains(r#"<SolidDomain name="Elements_Plaque" mat="Plaque"/>"#));

    let rebuilt = feb.read_str(&text).unwrap();
    assert_eq!(rebuilt.materials, model.materials);
    assert_eq!(rebuilt.mesh.elements, model.mesh.elements);
    assert_eq!(rebuilt.domains, model.domains);
}

#[test]
fn test_programmatic_empty_lists_round_trip() {
    let registry = TypeRegistry::febio();
    let feb = Feb::new(&registry);
    let mut model = build_ok(TWO_FACE_SURFACE);
    model.boundary_conditions[0].params = Params::new().with("dofs", FieldValue::Tokens(Vec::new()));

    let rebuilt = feb.read_str(&feb.write_string(&model).unwrap()).unwrap();
    assert_eq!(rebuilt.boundary_conditions, model.boundary_conditions);
}
