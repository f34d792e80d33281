// The gl table: lists, GPU objects and the context protocol seen from Lua.
mod utils;

use std::rc::{Rc, Weak};

use bzclient_core::events::ClientInfo;
use bzclient_lua::LuaHandle;
use bzclient_render::{ContextResource, ObjectKind};
use utils::{global, host};

const LIST_SCRIPT: &str = r#"
    local function build()
        return gl.CreateList(function()
            inside = gl.CreatingList()
            gl.PushAttrib()
            gl.PopAttrib()
        end)
    end
    list = build()
    rebuild = true
    frees, inits, drawn = 0, 0, 0

    function DrawScreen()
        gl.CallList(list)
        drawn = drawn + 1
    end
    function GLContextFree() frees = frees + 1 end
    function GLContextInit()
        inits = inits + 1
        if rebuild then list = build() end
    end
"#;

#[test]
fn lists_are_rebuilt_after_a_context_reset() {
    let (mut host, _gl) = host();
    let handle = host
        .load_script(ClientInfo::new("lists", 1), LIST_SCRIPT, "lists.lua")
        .unwrap();
    assert!(global::<bool>(&handle, "inside"));
    assert!(!host.render().pass().creating_list());

    assert_eq!(host.run_frame(), 0);
    host.reset_context().unwrap();
    assert_eq!(global::<i64>(&handle, "frees"), 1);
    assert_eq!(global::<i64>(&handle, "inits"), 1);
    assert_eq!(host.run_frame(), 0);
    assert_eq!(global::<i64>(&handle, "drawn"), 2);

    handle.exec("rebuild = false").unwrap();
    host.reset_context().unwrap();
    // the old list is gone and nothing replaced it
    assert_eq!(host.run_frame(), 1);
    assert_eq!(global::<i64>(&handle, "drawn"), 2);
}

#[test]
fn registry_recreates_what_it_can() {
    let (mut host, gl) = host();
    let source = r#"
        tex = gl.CreateTexture(64, 64)
        fbo = gl.CreateFBO()
        rbo = gl.CreateRBO(64, 64)
        buf = gl.CreateBuffer({ 0, 1, 0, 1 })
        query = gl.CreateQuery()
    "#;
    host.load_script(ClientInfo::new("objects", 1), source, "objects.lua")
        .unwrap();
    assert_eq!(gl.live_objects(ObjectKind::Texture), 1);
    assert_eq!(gl.live_objects(ObjectKind::Framebuffer), 1);

    host.reset_context().unwrap();
    assert_eq!(gl.leaked(), 0);
    assert_eq!(gl.live_objects(ObjectKind::Texture), 0);
    assert_eq!(gl.live_objects(ObjectKind::Framebuffer), 0);
    assert_eq!(gl.live_objects(ObjectKind::Renderbuffer), 1);
    assert_eq!(gl.live_objects(ObjectKind::Buffer), 1);
    assert_eq!(gl.live_objects(ObjectKind::Query), 1);
    assert_eq!(gl.double_deletes(), 0);
}

#[test]
fn unloading_frees_script_objects() {
    let (mut host, gl) = host();
    let before = gl.live_count();
    let source = r#"
        a = gl.CreateTexture(8, 8)
        b = gl.CreateQuery()
        c = gl.CreateList(function() end)
    "#;
    host.load_script(ClientInfo::new("owner", 1), source, "owner.lua")
        .unwrap();
    assert_eq!(gl.live_count(), before + 3);
    host.unload_script("owner").unwrap();
    assert_eq!(gl.live_count(), before);
    assert_eq!(gl.double_deletes(), 0);
}

#[test]
fn stack_misuse_raises_lua_errors() {
    let (mut host, _gl) = host();
    let source = r#"
        outside_ok = pcall(gl.PushAttrib)
        bad_mode_ok = pcall(gl.MatrixMode, "GL_COLOR")
        function DrawScreen()
            first_pop = pcall(gl.PopAttrib)
            second_pop = pcall(gl.PopAttrib)
            gl.MatrixMode("GL_PROJECTION")
            proj_push = pcall(gl.PushMatrix)
            proj_overflow = pcall(gl.PushMatrix)
        end
    "#;
    let handle = host
        .load_script(ClientInfo::new("misuse", 1), source, "misuse.lua")
        .unwrap();
    assert!(!global::<bool>(&handle, "outside_ok"));
    assert!(!global::<bool>(&handle, "bad_mode_ok"));

    assert_eq!(host.run_frame(), 0);
    assert!(global::<bool>(&handle, "first_pop"));
    assert!(!global::<bool>(&handle, "second_pop"));
    assert!(global::<bool>(&handle, "proj_push"));
    assert!(!global::<bool>(&handle, "proj_overflow"));
    assert_eq!(host.render().pass().draw_mode(), None);
}

#[test]
fn handles_are_checked_by_kind() {
    let (mut host, _gl) = host();
    let source = r#"
        tex = gl.CreateTexture(4, 4)
        call_ok, call_err = pcall(gl.CallList, tex)
        call_err = tostring(call_err)
        wrong_delete = gl.DeleteList(tex)
        right_delete = gl.DeleteTexture(tex)
        again = gl.DeleteTexture(tex)
    "#;
    let handle = host
        .load_script(ClientInfo::new("kinds", 1), source, "kinds.lua")
        .unwrap();
    assert!(!global::<bool>(&handle, "call_ok"));
    assert!(global::<String>(&handle, "call_err").contains("is a texture"));
    assert!(!global::<bool>(&handle, "wrong_delete"));
    assert!(global::<bool>(&handle, "right_delete"));
    assert!(!global::<bool>(&handle, "again"));
}

#[test]
fn shader_failures_return_the_log() {
    let (mut host, gl) = host();
    let source = r##"
        bad, bad_log = gl.CreateShader({ vertex = "void main() {}", fragment = "#error broken" })
        good = gl.CreateShader({ vertex = "void main() {}", fragment = "void main() {}" })
        used = gl.UseShader(good)
    "##;
    let handle = host
        .load_script(ClientInfo::new("shaders", 1), source, "shaders.lua")
        .unwrap();
    assert_eq!(global::<Option<i64>>(&handle, "bad"), None);
    assert!(global::<String>(&handle, "bad_log").contains("fragment"));
    assert!(global::<i64>(&handle, "good") > 0);
    assert!(global::<bool>(&handle, "used"));
    assert!(gl.program().is_valid());
}

/// Runs Lua from inside the registry walks.
struct WalkWatcher {
    handle: Rc<LuaHandle>,
}

impl ContextResource for WalkWatcher {
    fn free_context(&self) {
        self.handle
            .exec("create_ok, create_err = pcall(gl.CreateQuery); create_err = tostring(create_err)")
            .unwrap();
    }

    fn init_context(&self) {
        self.handle
            .exec("delete_ok, delete_err = pcall(gl.DeleteTexture, tex); delete_err = tostring(delete_err)")
            .unwrap();
    }
}

#[test]
fn walks_refuse_script_creates_and_deletes() {
    let (mut host, _gl) = host();
    let handle = host
        .load_script(ClientInfo::new("walker", 1), "tex = gl.CreateTexture(2, 2)", "walker.lua")
        .unwrap();
    let watcher = Rc::new(WalkWatcher {
        handle: Rc::clone(&handle),
    });
    host.render()
        .registry()
        .register(Rc::downgrade(&watcher) as Weak<dyn ContextResource>);

    host.reset_context().unwrap();

    assert!(!global::<bool>(&handle, "create_ok"));
    assert!(global::<String>(&handle, "create_err").contains("free functions"));
    assert!(!global::<bool>(&handle, "delete_ok"));
    assert!(global::<String>(&handle, "delete_err").contains("init functions"));

    // outside the walk the same delete goes through
    handle.exec("late = gl.DeleteTexture(tex)").unwrap();
    assert!(global::<bool>(&handle, "late"));
}
