//! claude-desktop-installer - Claude Desktop, repackaged for Linux
//!
//! Extracts the upstream Windows installer, swaps the `claude-native`
//! platform module for a stub build, repacks the Electron resource archive
//! and installs the result under `~/.local`.

pub mod deps;
pub mod download;
pub mod fetch;
pub mod icons;
pub mod installer;
pub mod paths;
pub mod pipeline;
pub mod platform;
pub mod remover;
pub mod repack;
pub mod report;
pub mod stub;

/// Installer version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name, used for install paths and log prefixes
pub const APP_NAME: &str = "claude-desktop";

/// Display name shown in application menus
pub const APP_DISPLAY_NAME: &str = "Claude";

/// Desktop entry comment line
pub const APP_DESCRIPTION: &str = "Claude Desktop for Linux";

/// Window class the Electron app reports, used for taskbar grouping
pub const DESKTOP_WM_CLASS: &str = "Claude";

/// URL scheme the desktop entry claims (claude://...)
pub const URL_SCHEME: &str = "claude";

/// Upstream Windows installer. Trusted as-is; there is no published
/// checksum or signature to verify against.
pub const INSTALLER_URL: &str = "https://storage.googleapis.com/osprey-downloads-c02f6a0d-347c-492b-a752-3e0651722e97/nest-win-x64/Claude-Setup-x64.exe";

/// Icon sizes installed into the hicolor theme
pub const ICON_SIZES: [u32; 6] = [16, 24, 32, 48, 64, 256];
