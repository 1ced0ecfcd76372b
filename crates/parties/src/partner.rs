use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use printshop_core::{Aggregate, AggregateId, AggregateRoot, DomainError, TenantId};
use printshop_events::Event;

/// Partner identifier (tenant-scoped via `tenant_id` fields in events/commands).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartnerId(pub AggregateId);

impl PartnerId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for PartnerId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Aggregate root: Partner (a person or company in the directory).
///
/// A partner counts as a customer once its `customer_rank` is above zero. The
/// rank grows each time the partner is marked as a customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partner {
    id: PartnerId,
    tenant_id: Option<TenantId>,
    name: String,
    email: Option<String>,
    customer_rank: u32,
    active: bool,
    version: u64,
    created: bool,
}

impl Partner {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: PartnerId) -> Self {
        Self {
            id,
            tenant_id: None,
            name: String::new(),
            email: None,
            customer_rank: 0,
            active: true,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> PartnerId {
        self.id
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn customer_rank(&self) -> u32 {
        self.customer_rank
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Eligibility predicate used when an order picks its customer.
    pub fn is_customer(&self) -> bool {
        self.created && self.active && self.customer_rank > 0
    }
}

impl AggregateRoot for Partner {
    type Id = PartnerId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: RegisterPartner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterPartner {
    pub tenant_id: TenantId,
    pub partner_id: PartnerId,
    pub name: String,
    pub email: Option<String>,
    /// Starting rank; 0 registers a plain contact.
    pub customer_rank: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Command: MarkAsCustomer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkAsCustomer {
    pub tenant_id: TenantId,
    pub partner_id: PartnerId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ArchivePartner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchivePartner {
    pub tenant_id: TenantId,
    pub partner_id: PartnerId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartnerCommand {
    RegisterPartner(RegisterPartner),
    MarkAsCustomer(MarkAsCustomer),
    ArchivePartner(ArchivePartner),
}

/// Event: PartnerRegistered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnerRegistered {
    pub tenant_id: TenantId,
    pub partner_id: PartnerId,
    pub name: String,
    pub email: Option<String>,
    pub customer_rank: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CustomerRankIncreased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRankIncreased {
    pub tenant_id: TenantId,
    pub partner_id: PartnerId,
    pub customer_rank: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PartnerArchived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnerArchived {
    pub tenant_id: TenantId,
    pub partner_id: PartnerId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartnerEvent {
    PartnerRegistered(PartnerRegistered),
    CustomerRankIncreased(CustomerRankIncreased),
    PartnerArchived(PartnerArchived),
}

impl Event for PartnerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            PartnerEvent::PartnerRegistered(_) => "parties.partner.registered",
            PartnerEvent::CustomerRankIncreased(_) => "parties.partner.customer_rank_increased",
            PartnerEvent::PartnerArchived(_) => "parties.partner.archived",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            PartnerEvent::PartnerRegistered(e) => e.occurred_at,
            PartnerEvent::CustomerRankIncreased(e) => e.occurred_at,
            PartnerEvent::PartnerArchived(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Partner {
    type Command = PartnerCommand;
    type Event = PartnerEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            PartnerEvent::PartnerRegistered(e) => {
                self.id = e.partner_id;
                self.tenant_id = Some(e.tenant_id);
                self.name = e.name.clone();
                self.email = e.email.clone();
                self.customer_rank = e.customer_rank;
                self.active = true;
                self.created = true;
            }
            PartnerEvent::CustomerRankIncreased(e) => {
                self.customer_rank = e.customer_rank;
            }
            PartnerEvent::PartnerArchived(_) => {
                self.active = false;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            PartnerCommand::RegisterPartner(cmd) => self.handle_register(cmd),
            PartnerCommand::MarkAsCustomer(cmd) => self.handle_mark_as_customer(cmd),
            PartnerCommand::ArchivePartner(cmd) => self.handle_archive(cmd),
        }
    }
}

impl Partner {
    fn ensure_target(&self, tenant_id: TenantId, partner_id: PartnerId) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        if self.tenant_id != Some(tenant_id) {
            return Err(DomainError::invariant("tenant mismatch"));
        }
        if self.id != partner_id {
            return Err(DomainError::invariant("partner_id mismatch"));
        }
        Ok(())
    }

    fn handle_register(&self, cmd: &RegisterPartner) -> Result<Vec<PartnerEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("partner already exists"));
        }

        if cmd.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }

        Ok(vec![PartnerEvent::PartnerRegistered(PartnerRegistered {
            tenant_id: cmd.tenant_id,
            partner_id: cmd.partner_id,
            name: cmd.name.trim().to_string(),
            email: cmd.email.clone(),
            customer_rank: cmd.customer_rank,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_mark_as_customer(
        &self,
        cmd: &MarkAsCustomer,
    ) -> Result<Vec<PartnerEvent>, DomainError> {
        self.ensure_target(cmd.tenant_id, cmd.partner_id)?;

        if !self.active {
            return Err(DomainError::invariant("archived partners cannot become customers"));
        }

        Ok(vec![PartnerEvent::CustomerRankIncreased(CustomerRankIncreased {
            tenant_id: cmd.tenant_id,
            partner_id: cmd.partner_id,
            customer_rank: self.customer_rank.saturating_add(1),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_archive(&self, cmd: &ArchivePartner) -> Result<Vec<PartnerEvent>, DomainError> {
        self.ensure_target(cmd.tenant_id, cmd.partner_id)?;

        if !self.active {
            return Err(DomainError::conflict("partner is already archived"));
        }

        Ok(vec![PartnerEvent::PartnerArchived(PartnerArchived {
            tenant_id: cmd.tenant_id,
            partner_id: cmd.partner_id,
            occurred_at: cmd.occurred_at,
        })])
    }
}
