//! Output formatting for the CLI.

mod report;

pub use report::{format_field, print_masks, print_match_results, print_subnets};
