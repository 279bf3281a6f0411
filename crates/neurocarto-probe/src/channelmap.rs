// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Channel map contract.

A channel map is the probe-family-specific container of electrodes that are
currently wired to readout channels. The core only needs to know its probe
type, how many electrodes it holds and how many channels it can hold; the
family's [`ProbeDesp`](crate::ProbeDesp) does everything else.

Invariants every implementation keeps:
- every contained electrode is `Used`;
- no identity appears twice;
- `Clone` yields a value that shares no electrode storage with the original.
*/

/// Common view of a probe-family channel map
pub trait ChannelMap: Clone {
    /// Probe type code this map was created for
    fn probe_code(&self) -> u32;

    /// Number of electrodes currently wired to channels
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Channel budget: the maximal number of electrodes this map can hold
    fn n_channels(&self) -> usize;

    /// True when every channel is in use
    fn is_full(&self) -> bool {
        self.len() >= self.n_channels()
    }
}
