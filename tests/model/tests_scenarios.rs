#![allow(clippy::unwrap_used)]

use feb::codec::{AnalysisKind, ElementShape, Interpolation, ModuleKind, QnMethod};
use feb::model::{BcType, LogKind, MaterialType, NodeTarget, OutputEntry, SurfaceLoadType};
use feb::FieldValue;

use crate::helpers::document_fixtures::TET4;
use crate::helpers::model_helpers::build_ok;

#[test]
fn test_tet4_builds_and_binds_linear_controller() {
    let model = build_ok(TET4);

    assert_eq!(model.mesh.nodes.len(), 1);
    assert_eq!(model.mesh.nodes[0].nodes.len(), 4);
    let part = &model.mesh.elements[0];
    assert_eq!(part.shape, ElementShape::Tet4);
    assert_eq!(part.elements[0].nodes, [1, 2, 3, 4]);

    let domain = &model.domains[0];
    let material = model.material(domain.material).unwrap();
    assert_eq!(material.kind, MaterialType::NeoHookean);
    assert_eq!(material.params.real("density"), Some(1.0));
    assert_eq!(material.params.real("E"), Some(0.3));
    assert_eq!(material.params.real("v"), Some(0.48));
    assert_eq!(model.elements_group(domain.elements).unwrap().name, "Part1");

    let bc = &model.boundary_conditions[0];
    assert_eq!(bc.kind, BcType::Fix);
    assert_eq!(
        bc.params.get("dofs").and_then(FieldValue::as_tokens),
        Some(&["x".to_string(), "y".to_string(), "z".to_string()][..])
    );
    match bc.target.as_ref().unwrap() {
        NodeTarget::Surface { surface, nodes } => {
            assert_eq!(model.surface(*surface).unwrap().faces.len(), 1);
            assert_eq!(nodes, &[1, 2, 3]);
        }
        other => panic!("expected a surface target, got {other:?}"),
    }

    let load = &model.surface_loads[0];
    assert_eq!(load.kind, SurfaceLoadType::Pressure);
    assert_eq!(model.surface(load.surface).unwrap().name, "PressureLoad1");
    assert_eq!(load.params.flag("linear"), Some(false));
    assert_eq!(load.params.flag("symmetric_stiffness"), Some(true));

    let magnitude = load.magnitude().unwrap();
    assert_eq!(magnitude.scale, 0.016);
    let controller = model.load_controller(magnitude.controller.unwrap()).unwrap();
    assert_eq!(controller.id, 1);
    assert_eq!(controller.interpolation(), Some(Interpolation::Linear));
    assert_eq!(controller.interpolation().unwrap().to_string(), "LINEAR");
    assert_eq!(controller.points(), [[0.0, 0.0], [1.0, 1.0]]);
}

#[test]
fn test_tet4_control_globals_and_output() {
    let model = build_ok(TET4);
    assert_eq!(model.version, "3.0");
    assert_eq!(model.module.as_ref().unwrap().kind, ModuleKind::Solid);

    let control = model.control.as_ref().unwrap();
    assert_eq!(control.analysis, AnalysisKind::Static);
    assert_eq!(control.time_steps, 10);
    assert_eq!(control.step_size, 0.1);

    let solver = control.solver.as_ref().unwrap();
    assert_eq!(solver.max_refs, Some(15));
    assert_eq!(solver.min_residual, Some(1e-20));
    assert_eq!(solver.qnmethod, Some(QnMethod::Bfgs));
    assert_eq!(solver.attributes, [("type".to_string(), "solid".to_string())]);

    let stepper = control.time_stepper.as_ref().unwrap();
    assert_eq!(stepper.dtmin, Some(0.01));
    assert_eq!(stepper.dtmax.as_ref().map(|d| (d.scale, d.controller)), Some((0.1, None)));
    assert_eq!(stepper.opt_iter, Some(10));

    let globals = model.globals.as_ref().unwrap();
    assert_eq!(globals.constants.as_ref().unwrap().names(), ["T", "R", "Fc"]);
    assert_eq!(globals.constant("R"), Some(0.0));

    let output = model.output.as_ref().unwrap();
    assert!(matches!(&output.entries[0], OutputEntry::Opaque(node) if node.name == "plotfile"));
    let OutputEntry::LogFile(log) = &output.entries[1] else {
        panic!("expected a logfile entry");
    };
    assert_eq!(log.file.as_deref(), Some("tet4.log"));
    assert_eq!(log.requests.len(), 2);
    assert_eq!(log.requests[0].kind, LogKind::ElementData);
    assert_eq!(log.requests[0].data, ["Ex", "Ey", "Ez"]);
    assert_eq!(log.requests[0].delim.as_deref(), Some(","));
    assert!(log.requests[0].items.is_empty());
    assert_eq!(log.requests[1].name.as_deref(), Some("stress"));
    assert_eq!(log.requests[1].items, [1]);
}
