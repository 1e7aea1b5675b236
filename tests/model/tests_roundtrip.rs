#![allow(clippy::unwrap_used)]

use feb::model::{Constant, MeshPart, Section, Slot};
use rstest::rstest;

use crate::helpers::document_fixtures::{
    PASSTHROUGH, REORDERED, STUDIO_CONTROL, TET4, TWO_FACE_SURFACE,
};
use crate::helpers::model_helpers::{build_ok, render};

#[rstest]
#[case::tet4(TET4)]
#[case::passthrough(PASSTHROUGH)]
#[case::reordered(REORDERED)]
#[case::two_face_surface(TWO_FACE_SURFACE)]
#[case::studio_control(STUDIO_CONTROL)]
fn test_rendered_document_builds_the_same_model(#[case] document: &str) {
    let model = build_ok(document);
    let rendered = render(&model);
    let rebuilt = build_ok(&rendered);
    assert_eq!(rebuilt, model, "rendered:\n{rendered}");
}

#[rstest]
#[case::tet4(TET4)]
#[case::passthrough(PASSTHROUGH)]
#[case::reordered(REORDERED)]
#[case::studio_control(STUDIO_CONTROL)]
fn test_render_is_idempotent(#[case] document: &str) {
    let first = render(&build_ok(document));
    let second = render(&build_ok(&first));
    assert_eq!(first, second);
}

#[test]
fn test_section_order_is_preserved() {
    let model = build_ok(REORDERED);
    assert_eq!(
        model.layout,
        [
            Section::LoadData,
            Section::Loads,
            Section::Control,
            Section::Mesh,
            Section::Module
        ]
    );
    assert_eq!(model.mesh.layout, [MeshPart::Surface(0), MeshPart::Nodes(0)]);

    let rendered = render(&model);
    let load_data = rendered.find("<LoadData>").unwrap();
    let loads = rendered.find("<Loads>").unwrap();
    let module = rendered.find("<Module").unwrap();
    assert!(load_data < loads && loads < module);
    assert!(rendered.find("<Surface").unwrap() < rendered.find("<Nodes").unwrap());
}

#[test]
fn test_opaque_section_keeps_its_place() {
    let model = build_ok(PASSTHROUGH);
    assert_eq!(model.layout[1], Section::Opaque(0));
    assert_eq!(model.extra_sections[0].name, "Contact");

    let rendered = render(&model);
    let material = rendered.find("<Material>").unwrap();
    let contact = rendered.find("<Contact>").unwrap();
    let mesh = rendered.find("<Mesh>").unwrap();
    assert!(material < contact && contact < mesh);
    assert!(rendered.contains(r#"<contact type="sliding-elastic" surface_pair="Pair1">"#));
}

#[test]
fn test_rendered_text_conventions() {
    let rendered = render(&build_ok(TET4));
    assert!(rendered.starts_with(r#"<?xml version="1.0" encoding="ISO-8859-1"?>"#));
    assert!(rendered.contains("\n\t<Module type=\"solid\"/>"));
    assert!(rendered.contains("<min_residual>1e-20</min_residual>"));
    assert!(rendered.contains(r#"<pressure lc="1">0.016</pressure>"#));
    assert!(rendered.contains(r#"node_set="@surface:FixedDisplacement1""#));
    assert!(rendered.contains(r#"<SolidDomain name="Part1" mat="Material1"/>"#));
    assert!(rendered.contains("<elem id=\"1\">1,2,3,4</elem>"));
    assert!(rendered.contains(r#"<element_data data="sx;sy;sz" name="stress" delim=",">1</element_data>"#));
}

#[test]
fn test_defaults_are_not_materialized() {
    let model = build_ok(TET4);
    let load = &model.surface_loads[0];
    assert!(!load.params.contains("shell_bottom"));
    let rendered = render(&model);
    assert!(!rendered.contains("shell_bottom"));
}

/// The lines of `document` from the line containing `open` through the line
/// containing `close`.
fn block<'a>(document: &'a str, open: &str, close: &str) -> &'a str {
    let start = document[..document.find(open).unwrap()].rfind('\n').unwrap() + 1;
    let end = document.find(close).unwrap() + close.len();
    &document[start..end]
}

#[test]
fn test_control_children_keep_document_order() {
    let model = build_ok(STUDIO_CONTROL);
    let control = model.control.as_ref().unwrap();
    assert_eq!(control.layout[3], Slot::Extra(0));
    assert_eq!(control.extras[0].name, "plot_level");
    assert_eq!(
        control.solver.as_ref().unwrap().layout,
        [
            Slot::Field("symmetric_stiffness"),
            Slot::Field("max_refs"),
            Slot::Field("etol")
        ]
    );

    let rendered = render(&model);
    let expected = block(STUDIO_CONTROL, "<Control>", "</Control>");
    assert!(rendered.contains(expected), "rendered:\n{rendered}");
}

#[test]
fn test_fields_set_in_code_follow_recorded_children() {
    let mut model = build_ok(STUDIO_CONTROL);
    let solver = model.control.as_mut().unwrap().solver.as_mut().unwrap();
    solver.rtol = Some(0.0);

    let rendered = render(&model);
    let etol = rendered.find("<etol>").unwrap();
    let rtol = rendered.find("<rtol>0</rtol>").unwrap();
    assert!(etol < rtol && rtol < rendered.find("</solver>").unwrap());
}

#[test]
fn test_globals_keep_every_constant() {
    let model = build_ok(STUDIO_CONTROL);
    let globals = model.globals.as_ref().unwrap();
    let constants = globals.constants.as_ref().unwrap();
    assert_eq!(constants.names(), ["T", "T", "R", "Fc"]);
    assert!(matches!(constants.entries[1], Constant::Opaque(_)));
    assert!(matches!(constants.entries[2], Constant::Opaque(_)));
    assert_eq!(globals.constant("T"), Some(0.0));
    assert_eq!(globals.constant("Fc"), Some(96485.0));

    let rendered = render(&model);
    let expected = block(STUDIO_CONTROL, "<Globals>", "</Globals>");
    assert!(rendered.contains(expected), "rendered:\n{rendered}");
}

#[test]
fn test_globals_without_constants_stay_without() {
    let document = STUDIO_CONTROL.replace(
        "\t\t<Constants>\n\t\t\t<T>0</T>\n\t\t\t<T>300</T>\n\t\t\t<R unit=\"J/mol/K\">8.314</R>\n\t\t\t<Fc>96485</Fc>\n\t\t</Constants>\n",
        "",
    );
    let model = build_ok(&document);
    assert!(model.globals.as_ref().unwrap().constants.is_none());

    let rendered = render(&model);
    assert!(rendered.contains("<Solutes>"));
    assert!(!rendered.contains("Constants"));
}

#[test]
fn test_removed_record_sections_are_not_written() {
    let mut model = build_ok(STUDIO_CONTROL);
    model.module = None;
    model.globals = None;

    let rendered = render(&model);
    assert!(!rendered.contains("<Module"));
    assert!(!rendered.contains("<Globals"));
    let rebuilt = build_ok(&rendered);
    assert!(rebuilt.module.is_none());
    assert_eq!(rebuilt.control, model.control);
}
