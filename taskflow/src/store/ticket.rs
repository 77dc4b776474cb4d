//! Load tickets: ordering for overlapping fetches of the same resource.
//!
//! Each fetch takes a ticket from a monotonically increasing counter. A
//! response is applied only if its ticket is newer than the last applied
//! one, so an older response that arrives late never overwrites a newer
//! snapshot. The loading flag stays raised until the most recently issued
//! fetch has settled.

/// Verdict for a successful response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settled {
    /// The response is the newest seen; replace the held value.
    Apply,
    /// A newer response was already applied; drop this one.
    Discard,
}

/// Ticket counters for one fetched resource.
#[derive(Debug, Clone)]
pub struct TicketBook {
    issued: u64,
    applied: u64,
    newest_settled: bool,
}

impl Default for TicketBook {
    fn default() -> Self {
        Self::new()
    }
}

impl TicketBook {
    /// A book with no fetches issued.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            issued: 0,
            applied: 0,
            newest_settled: true,
        }
    }

    /// Starts a fetch and returns its ticket.
    pub const fn issue(&mut self) -> u64 {
        self.issued += 1;
        self.newest_settled = false;
        self.issued
    }

    /// Records a successful response for `ticket`.
    pub const fn succeed(&mut self, ticket: u64) -> Settled {
        self.settle(ticket);
        if ticket > self.applied {
            self.applied = ticket;
            Settled::Apply
        } else {
            Settled::Discard
        }
    }

    /// Records a failed fetch for `ticket`.
    pub const fn fail(&mut self, ticket: u64) {
        self.settle(ticket);
    }

    /// Whether any response has ever been applied.
    #[must_use]
    pub const fn has_applied(&self) -> bool {
        self.applied > 0
    }

    /// A fetch is in flight, or nothing has loaded yet.
    #[must_use]
    pub const fn loading(&self) -> bool {
        !self.newest_settled || !self.has_applied()
    }

    const fn settle(&mut self, ticket: u64) {
        if ticket == self.issued {
            self.newest_settled = true;
        }
    }
}
