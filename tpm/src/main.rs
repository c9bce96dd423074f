#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! # TPM
//!
//! Entry point for the `tpm` binary. See [`tpm::app::run`].

use anyhow::Result;
use clap::Parser;
use tpm::cli::Args;

fn main() -> Result<()> {
    let args = Args::parse();
    tpm::app::run(&args)
}
