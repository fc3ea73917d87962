//! Stub claude-native module
//!
//! The app's JavaScript layer requires `claude-native` at startup and throws
//! if the binding is absent. This materializes and compiles a placeholder
//! with the same call surface: every operation is a no-op or returns a
//! constant. Window management and input emulation do nothing on Linux.

use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;

/// Build artifact npm/node-gyp produces, relative to the stub directory
pub const ARTIFACT_RELPATH: &str = "build/Release/claude-native-binding.node";

#[derive(Error, Debug)]
pub enum StubError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("manifest serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("npm build exited with {0}")]
    Build(std::process::ExitStatus),

    #[error("failed to run npm: {0}")]
    Spawn(std::io::Error),

    #[error("expected build artifact missing: {}", .0.display())]
    ArtifactMissing(PathBuf),
}

const BINDING_GYP: &str = r#"{
  "targets": [
    {
      "target_name": "claude-native-binding",
      "sources": ["claude_native.c"]
    }
  ]
}
"#;

const STUB_SOURCE: &str = r#"#include <node_api.h>
#include <stdbool.h>

/* Placeholder implementations. The real module drives the Win32 window and
 * input APIs; none of that exists here. */

static napi_value ret_undefined(napi_env env, napi_callback_info info) {
  (void)info;
  napi_value v;
  napi_get_undefined(env, &v);
  return v;
}

static napi_value ret_false(napi_env env, napi_callback_info info) {
  (void)info;
  napi_value v;
  napi_get_boolean(env, false, &v);
  return v;
}

static napi_value ret_empty_array(napi_env env, napi_callback_info info) {
  (void)info;
  napi_value v;
  napi_create_array(env, &v);
  return v;
}

static napi_value ret_windows_version(napi_env env, napi_callback_info info) {
  (void)info;
  napi_value v;
  napi_create_string_utf8(env, "10.0.19045", NAPI_AUTO_LENGTH, &v);
  return v;
}

#define STUB_METHOD(name, fn) { name, 0, fn, 0, 0, 0, napi_default, 0 }

static napi_value init(napi_env env, napi_value exports) {
  napi_property_descriptor props[] = {
    STUB_METHOD("getWindowsVersion", ret_windows_version),
    STUB_METHOD("getIsMaximized", ret_false),
    STUB_METHOD("setWindowEffect", ret_undefined),
    STUB_METHOD("removeWindowEffect", ret_undefined),
    STUB_METHOD("flashFrame", ret_undefined),
    STUB_METHOD("clearFlashFrame", ret_undefined),
    STUB_METHOD("showNotification", ret_undefined),
    STUB_METHOD("setProgressBar", ret_undefined),
    STUB_METHOD("clearProgressBar", ret_undefined),
    STUB_METHOD("setOverlayIcon", ret_undefined),
    STUB_METHOD("clearOverlayIcon", ret_undefined),
    STUB_METHOD("enumerateWindows", ret_empty_array),
    STUB_METHOD("getActiveWindow", ret_undefined),
    STUB_METHOD("focusWindow", ret_undefined),
    STUB_METHOD("getWindowBounds", ret_undefined),
    STUB_METHOD("setWindowBounds", ret_undefined),
    STUB_METHOD("listMonitors", ret_empty_array),
    STUB_METHOD("getMonitorInfo", ret_undefined),
    STUB_METHOD("sendKeyboardEvent", ret_undefined),
    STUB_METHOD("sendMouseEvent", ret_undefined),
    STUB_METHOD("typeText", ret_undefined),
  };
  napi_define_properties(env, exports, sizeof(props) / sizeof(props[0]), props);
  return exports;
}

NAPI_MODULE(claude_native_binding, init)
"#;

const INDEX_JS: &str = r#"const native = require('./build/Release/claude-native-binding.node');

// Key codes the app passes to sendKeyboardEvent. The native side ignores
// them, but the enum has to exist for the renderer to load.
const KeyboardKey = Object.freeze({
  Backspace: 43, Tab: 280, Enter: 261, Shift: 272, Control: 61, Alt: 40,
  Pause: 209, CapsLock: 56, Escape: 85, Space: 276, PageUp: 251,
  PageDown: 250, End: 83, Home: 154, LeftArrow: 175, UpArrow: 282,
  RightArrow: 262, DownArrow: 81, PrintScreen: 245, Insert: 155, Delete: 79,
  Num0: 204, Num1: 205, Num2: 206, Num3: 207, Num4: 208, Num5: 210,
  Num6: 211, Num7: 212, Num8: 213, Num9: 214,
  A: 1, B: 2, C: 3, D: 4, E: 5, F: 6, G: 7, H: 8, I: 9, J: 10, K: 11,
  L: 12, M: 13, N: 14, O: 15, P: 16, Q: 17, R: 18, S: 19, T: 20, U: 21,
  V: 22, W: 23, X: 24, Y: 25, Z: 26,
  LeftWindows: 92, RightWindows: 265, Applications: 48,
  Numpad0: 193, Numpad1: 194, Numpad2: 195, Numpad3: 196, Numpad4: 197,
  Numpad5: 198, Numpad6: 199, Numpad7: 200, Numpad8: 201, Numpad9: 202,
  Multiply: 190, Add: 39, Separator: 271, Subtract: 278, Decimal: 68,
  Divide: 80,
  F1: 86, F2: 97, F3: 108, F4: 119, F5: 130, F6: 141, F7: 142, F8: 143,
  F9: 144, F10: 87, F11: 88, F12: 89, F13: 90, F14: 91, F15: 93, F16: 94,
  F17: 95, F18: 96, F19: 98, F20: 99, F21: 100, F22: 101, F23: 102,
  F24: 103,
  NumLock: 218, ScrollLock: 268,
  LeftShift: 174, RightShift: 264, LeftControl: 162, RightControl: 263,
  LeftAlt: 164, RightAlt: 165,
  BrowserBack: 49, BrowserForward: 50, BrowserRefresh: 51, BrowserStop: 52,
  BrowserSearch: 53, BrowserFavorites: 54, BrowserHome: 55,
  VolumeMute: 173, VolumeDown: 174, VolumeUp: 175,
  MediaNextTrack: 176, MediaPrevTrack: 177, MediaStop: 178,
  MediaPlayPause: 179,
  Semicolon: 270, Equals: 84, Comma: 60, Minus: 189, Period: 244,
  Slash: 273, Backquote: 44, OpenBracket: 219, Backslash: 46,
  CloseBracket: 58, Quote: 255, OEM8: 223, OEM102: 226,
});

module.exports = { ...native, KeyboardKey };
"#;

/// Write package.json, binding.gyp, index.js and the C source into `stub_dir`
pub fn materialize(stub_dir: &Path) -> Result<(), StubError> {
    fs::create_dir_all(stub_dir)?;

    let manifest = json!({
        "name": "claude-native",
        "version": "1.0.0",
        "description": "Stub platform bindings for Claude Desktop on Linux",
        "main": "index.js",
        "gypfile": true,
    });
    fs::write(
        stub_dir.join("package.json"),
        serde_json::to_string_pretty(&manifest)?,
    )?;

    fs::write(stub_dir.join("binding.gyp"), BINDING_GYP)?;
    fs::write(stub_dir.join("claude_native.c"), STUB_SOURCE)?;
    fs::write(stub_dir.join("index.js"), INDEX_JS)?;
    Ok(())
}

/// Compile the stub via npm/node-gyp and verify the artifact exists.
/// Returns the path to the built .node binding.
pub fn build(stub_dir: &Path) -> Result<PathBuf, StubError> {
    let status = Command::new("npm")
        .args(["install", "--no-audit", "--no-fund"])
        .current_dir(stub_dir)
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map_err(StubError::Spawn)?;

    if !status.success() {
        return Err(StubError::Build(status));
    }

    let artifact = stub_dir.join(ARTIFACT_RELPATH);
    if !artifact.exists() {
        return Err(StubError::ArtifactMissing(artifact));
    }
    Ok(artifact)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn materialize_writes_a_buildable_module_layout() {
        let tmp = tempfile::tempdir().unwrap();
        materialize(tmp.path()).unwrap();

        let manifest: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(tmp.path().join("package.json")).unwrap())
                .unwrap();
        assert_eq!(manifest["name"], "claude-native");
        assert_eq!(manifest["gypfile"], true);

        // binding.gyp is plain JSON and names the expected target
        let gyp: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(tmp.path().join("binding.gyp")).unwrap())
                .unwrap();
        assert_eq!(gyp["targets"][0]["target_name"], "claude-native-binding");

        let index = fs::read_to_string(tmp.path().join("index.js")).unwrap();
        assert!(index.contains("KeyboardKey"));
        assert!(index.contains(ARTIFACT_RELPATH.trim_start_matches("build/Release/")));

        assert!(tmp.path().join("claude_native.c").exists());
    }

    #[test]
    fn missing_artifact_is_a_named_error() {
        let tmp = tempfile::tempdir().unwrap();
        let artifact = tmp.path().join(ARTIFACT_RELPATH);
        let err = StubError::ArtifactMissing(artifact.clone());
        assert!(err.to_string().contains("claude-native-binding.node"));
    }
}
