//! # strata-cli
//!
//! Command-line tool for running and managing Strata migrations.
//!
//! This crate provides the `strata` binary with the following commands:
//!
//! | Command | Description |
//! |---------|-------------|
//! | `strata migrate [latest]` | Apply every pending migration |
//! | `strata migrate up` | Apply the next pending migration |
//! | `strata migrate down` | Revert the most recently applied migration |
//! | `strata migrate to <key>` | Move forward or back until `<key>` is the last applied |
//! | `strata migrate reset` | Revert every applied migration |
//! | `strata new <name>` | Scaffold the next migration file |
//! | `strata status [--json]` | List resolved migrations and whether they are applied |
//!
//! Every command reads its settings from `strata.yaml` (see
//! [`strata_core::StrataConfig`]); `--profile` selects the profile overlay.

pub mod commands;
