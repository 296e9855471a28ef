//! JSON command protocol for driving an editor session.
//!
//! One command per JSON object, tagged by `"command"`. Every command yields
//! a [`CommandResponse`]; action failures are reported in it rather than as
//! a Rust error.

use std::path::PathBuf;

use msk_model::{Component, ComponentPath, JointType, Shape};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::actions::{ActionResult, BodyDetails, FixedPath};
use crate::property_edit::PropertyEdit;
use crate::state::UndoableModel;
use crate::uid::Uid;

/// A command an external driver can execute
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum EditorCommand {
    /// Add a body and the joint that attaches it
    AddBody {
        #[serde(default)]
        details: BodyDetails,
    },
    /// Add a prototype component to the set it belongs in
    AddComponent {
        component: Component,
    },
    AddOffsetFrame {
        path: ComponentPath,
    },
    AddParentOffsetFrame {
        path: ComponentPath,
    },
    AddChildOffsetFrame {
        path: ComponentPath,
    },
    AttachGeometry {
        path: ComponentPath,
        shape: Shape,
    },
    FitSphere {
        path: ComponentPath,
    },
    FitEllipsoid {
        path: ComponentPath,
    },
    FitPlane {
        path: ComponentPath,
    },
    Rename {
        path: ComponentPath,
        name: String,
    },
    ChangeJointType {
        path: ComponentPath,
        joint_type: JointType,
    },
    RezeroJoint {
        path: ComponentPath,
    },
    ReassignSocket {
        path: ComponentPath,
        socket: String,
        connectee: ComponentPath,
    },
    /// Delete `path`, or the selection if no path is given
    Delete {
        #[serde(default)]
        path: Option<ComponentPath>,
    },
    SetProperty {
        edit: PropertyEdit,
    },
    AddPathPoint {
        actuator: ComponentPath,
        frame: ComponentPath,
    },
    AssignContactGeometry {
        force: ComponentPath,
        geometry: ComponentPath,
    },
    /// Set a coordinate's value; `save` commits it as the default
    SetCoordinate {
        path: ComponentPath,
        value: f64,
        #[serde(default)]
        save: bool,
    },
    SetCoordinateSpeed {
        path: ComponentPath,
        speed: f64,
        #[serde(default)]
        save: bool,
    },
    LockCoordinate {
        path: ComponentPath,
        locked: bool,
    },
    ZeroCoordinates,
    TranslateStation {
        path: ComponentPath,
        delta: [f64; 3],
        #[serde(default)]
        save: bool,
    },
    TransformOffsetFrame {
        path: ComponentPath,
        #[serde(default)]
        translation: [f64; 3],
        #[serde(default)]
        rotation: [f64; 3],
    },
    SetVisibility {
        path: ComponentPath,
        visible: bool,
    },
    ShowOnly {
        path: ComponentPath,
    },
    ToggleFrames,
    ToggleMarkers,
    ToggleContactGeometry,
    ToggleForces,
    Select {
        #[serde(default)]
        path: Option<ComponentPath>,
    },
    Hover {
        #[serde(default)]
        path: Option<ComponentPath>,
    },
    Isolate {
        #[serde(default)]
        path: Option<ComponentPath>,
    },
    ClearSelection,
    SetScaleFactor {
        scale_factor: f32,
    },
    AutoscaleScaleFactor,
    Undo,
    Redo,
    Checkout {
        commit: Uid,
    },
    /// List the commits behind and ahead of the current head
    History,
    NewModel,
    Open {
        path: PathBuf,
    },
    /// Save to the backing file, or to `path` if there is none
    Save {
        #[serde(default)]
        path: Option<PathBuf>,
    },
    SaveAs {
        path: PathBuf,
    },
    Reload,
    /// Reload the backing file only if it changed on disk
    UpdateFromDisk,
    /// List every component of the model
    Inspect,
    /// Properties of one component
    GetProperties {
        path: ComponentPath,
    },
    /// Session summary: dirty flags, history position, selection
    Status,
}

/// Response from executing a command
#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl CommandResponse {
    fn ok() -> Self {
        Self {
            success: true,
            error: None,
            data: None,
        }
    }

    fn ok_with_data(data: serde_json::Value) -> Self {
        Self {
            success: true,
            error: None,
            data: Some(data),
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(msg.into()),
            data: None,
        }
    }
}

fn respond(result: ActionResult) -> CommandResponse {
    match result {
        Ok(()) => CommandResponse::ok(),
        Err(e) => CommandResponse::err(e.to_string()),
    }
}

fn respond_with_path(result: ActionResult<ComponentPath>) -> CommandResponse {
    match result {
        Ok(path) => CommandResponse::ok_with_data(json!({ "path": path })),
        Err(e) => CommandResponse::err(e.to_string()),
    }
}

fn respond_with_flag(key: &str, result: ActionResult<bool>) -> CommandResponse {
    match result {
        Ok(flag) => CommandResponse::ok_with_data(json!({ key: flag })),
        Err(e) => CommandResponse::err(e.to_string()),
    }
}

fn status(editor: &UndoableModel) -> serde_json::Value {
    let doc = editor.document();
    json!({
        "title": doc.recommended_title(),
        "head": editor.latest_commit_id(),
        "message": editor.latest_commit().map(|c| c.message().to_string()),
        "can_undo": editor.can_undo(),
        "can_redo": editor.can_redo(),
        "dirty": doc.is_dirty(),
        "up_to_date_with_filesystem": editor.is_up_to_date_with_filesystem(),
        "backing_file": doc.backing_file_path(),
        "selected": doc.selected(),
        "hovered": doc.hovered(),
        "isolated": doc.isolated(),
        "scale_factor": doc.scale_factor(),
    })
}

/// Execute a single command against an editor session
pub fn execute_command(editor: &mut UndoableModel, cmd: EditorCommand) -> CommandResponse {
    match cmd {
        EditorCommand::AddBody { details } => respond_with_path(editor.add_body(&details)),
        EditorCommand::AddComponent { component } => respond_with_path(editor.add_component(component)),
        EditorCommand::AddOffsetFrame { path } => respond_with_path(editor.add_offset_frame_to_physical_frame(&path)),
        EditorCommand::AddParentOffsetFrame { path } => {
            respond_with_path(editor.add_parent_offset_frame_to_joint(&path))
        }
        EditorCommand::AddChildOffsetFrame { path } => respond_with_path(editor.add_child_offset_frame_to_joint(&path)),
        EditorCommand::AttachGeometry { path, shape } => {
            respond_with_path(editor.attach_geometry_to_physical_frame(&path, shape))
        }
        EditorCommand::FitSphere { path } => respond_with_path(editor.fit_sphere_to_mesh(&path)),
        EditorCommand::FitEllipsoid { path } => respond_with_path(editor.fit_ellipsoid_to_mesh(&path)),
        EditorCommand::FitPlane { path } => respond_with_path(editor.fit_plane_to_mesh(&path)),
        EditorCommand::Rename { path, name } => respond_with_path(editor.set_component_name(&path, &name)),
        EditorCommand::ChangeJointType { path, joint_type } => respond(editor.change_joint_type(&path, joint_type)),
        EditorCommand::RezeroJoint { path } => respond(editor.rezero_joint(&path)),
        EditorCommand::ReassignSocket {
            path,
            socket,
            connectee,
        } => respond(editor.reassign_socket(&path, &socket, &connectee)),
        EditorCommand::Delete { path } => match path {
            Some(path) => respond(editor.delete_component(&path)),
            None => respond(editor.delete_selected()),
        },
        EditorCommand::SetProperty { edit } => respond(editor.apply_property_edit(&edit)),
        EditorCommand::AddPathPoint { actuator, frame } => respond_with_path(editor.add_path_point(&actuator, &frame)),
        EditorCommand::AssignContactGeometry { force, geometry } => {
            respond(editor.assign_contact_geometry(&force, &geometry))
        }
        EditorCommand::SetCoordinate { path, value, save } => respond(if save {
            editor.set_coordinate_value_and_save(&path, value)
        } else {
            editor.set_coordinate_value(&path, value)
        }),
        EditorCommand::SetCoordinateSpeed { path, speed, save } => respond(if save {
            editor.set_coordinate_speed_and_save(&path, speed)
        } else {
            editor.set_coordinate_speed(&path, speed)
        }),
        EditorCommand::LockCoordinate { path, locked } => respond(editor.set_coordinate_locked_and_save(&path, locked)),
        EditorCommand::ZeroCoordinates => respond(editor.zero_all_coordinates()),
        EditorCommand::TranslateStation { path, delta, save } => respond(if save {
            editor.translate_station_and_save(&path, delta)
        } else {
            editor.translate_station(&path, delta)
        }),
        EditorCommand::TransformOffsetFrame {
            path,
            translation,
            rotation,
        } => respond(editor.transform_offset_frame(&path, translation, rotation)),
        EditorCommand::SetVisibility { path, visible } => respond(editor.set_component_visibility(&path, visible)),
        EditorCommand::ShowOnly { path } => respond(editor.show_only_component(&path)),
        EditorCommand::ToggleFrames => respond(editor.toggle_frames()),
        EditorCommand::ToggleMarkers => respond(editor.toggle_markers()),
        EditorCommand::ToggleContactGeometry => respond(editor.toggle_contact_geometry()),
        EditorCommand::ToggleForces => respond(editor.toggle_forces()),
        EditorCommand::Select { path } => respond(editor.set_selected(path)),
        EditorCommand::Hover { path } => respond(editor.set_hovered(path)),
        EditorCommand::Isolate { path } => respond(editor.set_isolated(path)),
        EditorCommand::ClearSelection => {
            editor.clear_selection();
            CommandResponse::ok()
        }
        EditorCommand::SetScaleFactor { scale_factor } => respond(editor.set_scale_factor(scale_factor)),
        EditorCommand::AutoscaleScaleFactor => {
            let scale_factor = editor.autoscale_scale_factor();
            CommandResponse::ok_with_data(json!({ "scale_factor": scale_factor }))
        }
        EditorCommand::Undo => CommandResponse::ok_with_data(json!({ "undone": editor.do_undo() })),
        EditorCommand::Redo => CommandResponse::ok_with_data(json!({ "redone": editor.do_redo() })),
        EditorCommand::Checkout { commit } => {
            if editor.try_checkout(commit) {
                CommandResponse::ok()
            } else {
                CommandResponse::err(format!("no commit with id {commit}"))
            }
        }
        EditorCommand::History => CommandResponse::ok_with_data(json!({
            "head": editor.latest_commit_id(),
            "undo": editor.commits(),
            "redo": editor.redo_commits(),
        })),
        EditorCommand::NewModel => respond(editor.new_model()),
        EditorCommand::Open { path } => respond(editor.load_model_file(&path)),
        EditorCommand::Save { path } => respond_with_flag("saved", editor.save_model(&mut FixedPath(path))),
        EditorCommand::SaveAs { path } => respond_with_flag("saved", editor.save_model_as(&mut FixedPath(Some(path)))),
        EditorCommand::Reload => respond(editor.reload_from_disk()),
        EditorCommand::UpdateFromDisk => respond_with_flag("reloaded", editor.update_from_backing_file()),
        EditorCommand::Inspect => {
            let components: Vec<serde_json::Value> = editor
                .model()
                .walk()
                .into_iter()
                .map(|(path, c)| {
                    json!({
                        "path": path,
                        "type": c.class_name(),
                        "visible": c.visible,
                    })
                })
                .collect();
            CommandResponse::ok_with_data(json!({
                "name": editor.model().name,
                "component_count": components.len(),
                "components": components,
            }))
        }
        EditorCommand::GetProperties { path } => match editor.model().find(&path) {
            Some(c) => {
                let properties: serde_json::Map<String, serde_json::Value> = c
                    .property_names()
                    .into_iter()
                    .filter_map(|name| Some((name.to_string(), serde_json::to_value(c.property(name)?).ok()?)))
                    .collect();
                CommandResponse::ok_with_data(json!({
                    "path": path,
                    "type": c.class_name(),
                    "properties": properties,
                }))
            }
            None => CommandResponse::err(format!("{path}: cannot find component")),
        },
        EditorCommand::Status => CommandResponse::ok_with_data(status(editor)),
    }
}

/// Parse and execute a single JSON command string
pub fn execute_json(editor: &mut UndoableModel, json: &str) -> Result<CommandResponse, String> {
    let cmd: EditorCommand = serde_json::from_str(json).map_err(|e| format!("Invalid command JSON: {e}"))?;
    Ok(execute_command(editor, cmd))
}

/// Parse and execute multiple JSON commands (array)
pub fn execute_json_batch(editor: &mut UndoableModel, json: &str) -> Result<Vec<CommandResponse>, String> {
    let cmds: Vec<EditorCommand> = serde_json::from_str(json).map_err(|e| format!("Invalid commands JSON: {e}"))?;
    Ok(cmds.into_iter().map(|cmd| execute_command(editor, cmd)).collect())
}
