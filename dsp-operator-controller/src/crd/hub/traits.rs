// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

// Marker for the internal, version independent representation every served
// CRD version converts into
pub trait Hub {}
