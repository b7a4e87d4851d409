//! Constants shared by the integration tests

pub const OWNER: &str = "TermiSenpai";
pub const REPO: &str = "presupuestoapp";

pub const VERSION_1_0_0: &str = "1.0.0";
pub const VERSION_1_1_0: &str = "1.1.0";

pub const TAG_V1_0_0: &str = "v1.0.0";
pub const TAG_V1_1_0: &str = "v1.1.0";
pub const TAG_V2_0_0: &str = "v2.0.0";

pub const ASSET_ZIP: &str = "dtf-windows-x86_64.zip";
pub const ASSET_TAR_GZ: &str = "dtf-linux-x86_64.tar.gz";

pub const EXE_NAME: &str = "dtf";

pub const PACKAGE_PATH: &str = "/download/package";

pub const EXE_CONTENT_NEW: &[u8] = b"#!/bin/sh\necho dtf 1.1.0\n";
pub const EXE_CONTENT_OLD: &[u8] = b"#!/bin/sh\necho dtf 1.0.0\n";

/// A pid the fakes report as long gone
pub const EXITED_PID: u32 = 4_000_001;
/// A pid the fakes report as running forever
pub const STUCK_PID: u32 = 4_000_002;
