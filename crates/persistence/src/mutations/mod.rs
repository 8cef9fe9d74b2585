// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Write-side mutation operations.
//!
//! These functions assume the caller has opened the appropriate
//! transaction; none of them commits on its own.

pub mod audit;
pub mod bookings;
pub mod bootstrap;
pub mod series;
pub mod waitlist;
