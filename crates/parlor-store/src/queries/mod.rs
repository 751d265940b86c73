// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules. Each function is one atomic unit on the single
//! writer thread.

pub mod guard;
pub mod load;
pub mod rooms;
