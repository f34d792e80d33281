mod utils;

use bzclient_cli::commands::{event_rows, run_scripts, RunOptions};
use bzclient_cli::config::{ClientConfig, ScriptEntry};
use utils::{scratch_dir, write_script};

const SLOPPY: &str = r#"
frames = 0
tex = gl.CreateTexture(16, 16)

function DrawScreen()
  frames = frames + 1
  gl.PushAttrib()
  gl.PushMatrix()
end

function GLContextInit()
  tex = gl.CreateTexture(16, 16)
end
"#;

const BROKEN: &str = r#"
function DrawWorld()
  error("boom")
end
"#;

fn options(scripts: Vec<std::path::PathBuf>, frames: u64) -> RunOptions {
    RunOptions {
        scripts,
        frames,
        reset_every: None,
        config: ClientConfig::default(),
        progress: false,
    }
}

#[test]
fn test_run_survives_sloppy_and_broken_scripts() {
    let dir = scratch_dir("sloppy");
    let sloppy = write_script(&dir, "sloppy.lua", SLOPPY);
    let broken = write_script(&dir, "broken.lua", BROKEN);

    let mut opts = options(vec![sloppy, broken], 5);
    opts.reset_every = Some(2);
    let report = run_scripts(&opts).unwrap();

    assert_eq!(report.scripts, 2);
    assert_eq!(report.frames, 5);
    assert_eq!(report.resets, 2);
    assert_eq!(report.failed_passes, 5);
    assert_eq!(report.leaked_objects, 0);
    assert_eq!(report.double_deletes, 0);
    assert!(report.gl_errors.is_empty(), "{:?}", report.gl_errors);
    // Only the pass state lists outlive the scripts.
    assert_eq!(report.live_objects, 8);
}

#[test]
fn test_reset_is_not_run_after_last_frame() {
    let dir = scratch_dir("reset");
    let sloppy = write_script(&dir, "sloppy.lua", SLOPPY);
    let mut opts = options(vec![sloppy], 4);
    opts.reset_every = Some(2);
    assert_eq!(run_scripts(&opts).unwrap().resets, 1);

    opts.reset_every = Some(0);
    assert_eq!(run_scripts(&opts).unwrap().resets, 0);
}

#[test]
fn test_config_scripts_load_first() {
    let dir = scratch_dir("config");
    let configured = write_script(&dir, "radar.lua", SLOPPY);
    let named = write_script(&dir, "sloppy.lua", SLOPPY);

    let mut opts = options(vec![named], 1);
    opts.config.scripts.push(ScriptEntry {
        path: configured,
        name: "radar".to_string(),
        script_id: 10,
        game_state_order: None,
        draw_world_order: None,
        draw_screen_order: Some(5),
        full_read: false,
        game_ctrl: false,
        input_ctrl: true,
    });
    let report = run_scripts(&opts).unwrap();
    assert_eq!(report.scripts, 2);
    assert_eq!(report.failed_passes, 0);
}

#[test]
fn test_missing_script_is_an_error() {
    let dir = scratch_dir("missing");
    let err = run_scripts(&options(vec![dir.join("nope.lua")], 1)).unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to read Lua script"));
}

#[test]
fn test_config_file_round_trip() {
    let dir = scratch_dir("save");
    let path = dir.join("nested").join("config.json");
    let mut config = ClientConfig::default();
    config.max_attrib_depth = 3;
    config.shadows.stencil_shadows = true;
    config.save_to(&path).unwrap();

    let loaded = ClientConfig::load_from(&path).unwrap();
    assert_eq!(loaded, config);
    assert!(ClientConfig::load_from(&dir.join("absent.json")).is_err());
}

#[test]
fn test_event_rows() {
    let rows = event_rows();
    assert_eq!(rows.len(), 57);

    let draw_world = rows.iter().find(|r| r.name == "DrawWorld").unwrap();
    assert_eq!(draw_world.order, Some("DrawWorldOrder"));
    assert_eq!(draw_world.loop_type, "BASIC");
    assert_eq!(draw_world.props, vec!["reversed"]);

    let key_press = rows.iter().find(|r| r.name == "KeyPress").unwrap();
    assert_eq!(key_press.loop_type, "BOOLEAN_OR");
    assert_eq!(key_press.props, vec!["reqInputCtrl"]);

    let shutdown = rows.iter().find(|r| r.name == "Shutdown").unwrap();
    assert_eq!(shutdown.order, None);
}
