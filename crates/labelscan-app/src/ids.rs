// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::fmt;

/// Identifies one issued analysis request. Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u64);

impl RequestId {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RequestIdSequence {
    last: u64,
}

impl RequestIdSequence {
    pub fn next_id(&mut self) -> RequestId {
        self.last = self.last.wrapping_add(1);
        if self.last == 0 {
            self.last = 1;
        }
        RequestId(self.last)
    }
}

#[cfg(test)]
mod tests {
    use super::{RequestId, RequestIdSequence};

    #[test]
    fn sequence_starts_at_one_and_increments() {
        let mut sequence = RequestIdSequence::default();
        assert_eq!(sequence.next_id(), RequestId::new(1));
        assert_eq!(sequence.next_id(), RequestId::new(2));
    }

    #[test]
    fn sequence_skips_zero_on_wrap() {
        let mut sequence = RequestIdSequence { last: u64::MAX };
        assert_eq!(sequence.next_id(), RequestId::new(1));
    }
}
