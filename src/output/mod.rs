//! Console output for the service binary.

pub mod console;

pub use console::{
    print_banner, print_config_summary, print_error, print_info, print_shutdown, print_warning,
};
