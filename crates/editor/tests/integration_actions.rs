//! End-to-end editing scenarios through the action library.

use msk_editor_lib::actions::{ActionError, BodyDetails};
use msk_editor_lib::fixtures;
use msk_editor_lib::property_edit::{PropertyChange, PropertyEdit};
use msk_editor_lib::state::UndoableModel;
use msk_model::{ComponentPath, JointType, PropertyValue};

#[test]
fn test_add_body_to_empty_model() {
    let mut m = UndoableModel::new();
    let path = m.add_body(&BodyDetails::named("femur")).unwrap();

    assert!(m.model().contains(&path));
    assert!(m.model().contains(&"/jointset/ground_to_femur".into()));
    assert_eq!(m.document().selected(), Some(&path));
    assert!(m.can_undo());
    assert!(m.latest_commit().unwrap().message().contains("femur"));
}

#[test]
fn test_add_body_with_missing_parent_changes_nothing() {
    let mut m = UndoableModel::new();
    let version = m.document().model_version();
    let could_undo = m.can_undo();

    let err = m
        .add_body(&BodyDetails {
            parent_frame: "/bodyset/nowhere".into(),
            ..BodyDetails::named("femur")
        })
        .unwrap_err();

    assert!(err.is_precondition());
    assert!(!m.model().contains(&"/bodyset/femur".into()));
    assert_eq!(m.document().model_version(), version);
    assert_eq!(m.can_undo(), could_undo);
}

#[test]
fn test_rename_then_undo_and_redo() {
    let mut m = UndoableModel::new();
    let body = m.add_body(&BodyDetails::named("femur")).unwrap();
    let renamed = m.set_component_name(&body, "thigh").unwrap();
    let renamed_version = m.document().model_version();

    assert!(m.do_undo());
    assert!(m.model().contains(&body));
    assert!(!m.model().contains(&renamed));
    assert!(m.can_redo());

    assert!(m.do_redo());
    assert!(m.model().contains(&renamed));
    assert_eq!(m.document().model_version(), renamed_version);
}

#[test]
fn test_rename_propagates_to_sockets() {
    let mut m = fixtures::undoable_pendulum();
    m.set_component_name(&"/bodyset/arm".into(), "upper_arm").unwrap();
    let joint = m.model().find(&fixtures::shoulder_joint()).unwrap();
    assert_eq!(joint.socket("child_frame").unwrap().connectee().as_str(), "/bodyset/upper_arm");
    let tip = m.model().find(&"/markerset/tip".into()).unwrap();
    assert_eq!(tip.socket("parent_frame").unwrap().connectee().as_str(), "/bodyset/upper_arm");
}

#[test]
fn test_coordinate_drag_commits_once_with_coupled_defaults() {
    let mut m = fixtures::undoable_double_pendulum();
    let shoulder = fixtures::shoulder_coordinate();
    let elbow = fixtures::elbow_coordinate();
    let commits_before = m.commits().len();

    for i in 1..=50 {
        m.set_coordinate_value(&shoulder, f64::from(i) * 0.01).unwrap();
    }
    let dragged_elbow = m.state().coordinate_value(&elbow).unwrap();
    m.set_coordinate_value_and_save(&shoulder, 0.5).unwrap();

    assert_eq!(m.commits().len(), commits_before + 1);
    let coordinate = |p: &ComponentPath| m.model().find(p).unwrap().as_coordinate().unwrap().default_value;
    assert_eq!(coordinate(&shoulder), 0.5);
    assert!((coordinate(&elbow) - 0.25).abs() < 1e-12);
    assert!((dragged_elbow - 0.25).abs() < 1e-12);
}

#[test]
fn test_child_frame_to_ground_is_rejected_without_mutation() {
    let mut m = fixtures::undoable_pendulum();
    let version = m.document().model_version();
    let head = m.latest_commit_id();

    let err = m
        .reassign_socket(&fixtures::shoulder_joint(), "child_frame", &"/ground".into())
        .unwrap_err();

    assert!(err.is_precondition());
    assert!(!err.to_string().is_empty());
    assert_eq!(m.document().model_version(), version);
    assert_eq!(m.latest_commit_id(), head);
}

#[test]
fn test_failed_edits_never_change_model_version() {
    let mut m = fixtures::undoable_double_pendulum();
    let version = m.document().model_version();

    let attempts: Vec<Result<(), ActionError>> = vec![
        m.set_coordinate_value(&fixtures::shoulder_coordinate(), 100.0),
        m.delete_component(&"/bodyset/arm".into()),
        m.change_joint_type(&"/jointset/elbow".into(), JointType::Weld),
        m.rezero_joint(&fixtures::shoulder_joint()),
        m.apply_property_edit(&PropertyEdit::new("/bodyset/arm", "mass", PropertyChange::Toggle)),
        m.set_component_name(&"/bodyset/arm".into(), "bad/name").map(|_| ()),
    ];

    for attempt in attempts {
        assert!(attempt.is_err());
        assert_eq!(m.document().model_version(), version);
    }
}

#[test]
fn test_body_with_offset_frames_can_be_rezeroed() {
    let mut m = UndoableModel::new();
    let details = BodyDetails {
        joint_type: JointType::Pin,
        ..BodyDetails::named("flap")
    };
    m.add_body(&details).unwrap();
    let joint: ComponentPath = "/jointset/ground_to_flap".into();
    let coordinate = joint.join("ground_to_flap_rz");

    m.set_coordinate_value_and_save(&coordinate, 0.3).unwrap();
    assert!(m.can_rezero_joint(&joint));
    m.rezero_joint(&joint).unwrap();

    let offset = m
        .model()
        .find(&joint.join("ground_offset"))
        .unwrap()
        .as_offset_frame()
        .unwrap();
    assert!((offset.orientation[2] - 0.3).abs() < 1e-9);
    assert_eq!(m.state().coordinate_value(&coordinate), Some(0.0));
}

#[test]
fn test_property_edit_roundtrip_through_undo() {
    let mut m = fixtures::undoable_pendulum();
    m.apply_property_edit(&PropertyEdit::new("/bodyset/arm", "mass", PropertyChange::Scale { factor: 2.0 }))
        .unwrap();
    let mass = |m: &UndoableModel| m.model().find(&"/bodyset/arm".into()).unwrap().property("mass");
    assert_eq!(mass(&m), Some(PropertyValue::Double(2.0)));

    m.do_undo();
    assert_eq!(mass(&m), Some(PropertyValue::Double(1.0)));
}

#[test]
fn test_dragged_coordinate_survives_a_later_commit() {
    let mut m = fixtures::undoable_pendulum();
    let shoulder = fixtures::shoulder_coordinate();
    m.set_coordinate_value(&shoulder, 0.4).unwrap();
    assert_eq!(m.state().coordinate_value(&shoulder), Some(0.4));

    m.toggle_frames().unwrap();
    assert_eq!(m.state().coordinate_value(&shoulder), Some(0.4));
    let c = m.model().find(&shoulder).unwrap().as_coordinate().unwrap();
    assert_eq!(c.default_value, 0.4);

    // the drag belongs to the toggle's commit
    m.do_undo();
    assert_eq!(m.state().coordinate_value(&shoulder), Some(0.0));
}

#[test]
fn test_dragged_coupled_coordinates_keep_model_and_state_in_step() {
    let mut m = fixtures::undoable_double_pendulum();
    m.set_coordinate_value(&fixtures::shoulder_coordinate(), 0.6).unwrap();

    let elbow = fixtures::elbow_coordinate();
    let default = m.model().find(&elbow).unwrap().as_coordinate().unwrap().default_value;
    assert!((default - 0.3).abs() < 1e-12);
    assert!(!m.document().is_dirty());

    m.commit("keep pose").unwrap();
    assert!((m.state().coordinate_value(&elbow).unwrap() - 0.3).abs() < 1e-12);
}

#[test]
fn test_dragged_coordinate_survives_a_failed_action() {
    let mut m = fixtures::undoable_pendulum();
    let shoulder = fixtures::shoulder_coordinate();
    m.set_coordinate_value(&shoulder, 0.4).unwrap();
    let version = m.document().model_version();
    let head = m.latest_commit_id();

    let err = m.delete_component(&"/bodyset/arm".into()).unwrap_err();

    assert!(matches!(err, ActionError::Validation { .. }));
    assert_eq!(m.state().coordinate_value(&shoulder), Some(0.4));
    assert_eq!(m.document().model_version(), version);
    assert_eq!(m.latest_commit_id(), head);
    assert!(m.model().contains(&"/bodyset/arm".into()));
}

#[test]
fn test_dragged_station_survives_commit_and_failed_action() {
    let mut m = fixtures::undoable_pendulum();
    let tip: ComponentPath = "/markerset/tip".into();
    let location = |m: &UndoableModel| m.model().find(&"/markerset/tip".into()).unwrap().as_station().unwrap().location;

    m.translate_station(&tip, [0.0, 0.25, 0.0]).unwrap();
    assert!(m.delete_component(&"/bodyset/arm".into()).is_err());
    assert_eq!(location(&m), [1.0, 0.25, 0.0]);

    m.toggle_frames().unwrap();
    assert_eq!(location(&m), [1.0, 0.25, 0.0]);
}
