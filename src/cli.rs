mod args;

pub use args::{Cli, Command, OutputFormatArg, ScanArgs, ScanModeArg, VersionArgs};
