// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Read-side query operations.
//!
//! Each module holds free functions over a `SqliteConnection`. The
//! functions return domain types, converting rows at this boundary.

pub mod bookings;
pub mod pins;
pub mod settings;
pub mod waitlist;
