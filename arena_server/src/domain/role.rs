// Which side of the replication link this process plays.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Authoritative simulation owner.
    Server,
    /// Renders replicated state; never mutates it.
    Client,
}

impl Role {
    pub fn is_server(self) -> bool {
        matches!(self, Role::Server)
    }

    pub fn is_client(self) -> bool {
        matches!(self, Role::Client)
    }
}
