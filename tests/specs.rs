// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace scenario tests: a real fleet manager driving `sh` agents.

#[path = "specs/prelude.rs"]
mod prelude;

#[path = "specs/reload.rs"]
mod reload;
#[path = "specs/scheduling.rs"]
mod scheduling;
#[path = "specs/shutdown.rs"]
mod shutdown;
