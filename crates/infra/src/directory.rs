//! Customer directory: who an order can be placed for.

use std::sync::Arc;

use chrono::Utc;

use printshop_core::{AggregateId, TenantId};
use printshop_events::execute;
use printshop_parties::{
    ArchivePartner, MarkAsCustomer, Partner, PartnerCommand, PartnerId, RegisterPartner,
};

use crate::lookup::LookupError;
use crate::read_model::{InMemoryTenantStore, TenantStore};

/// Read access to partners.
///
/// Eligibility is decided by [`Partner::is_customer`], not by the directory.
pub trait CustomerDirectory: Send + Sync {
    fn lookup(&self, tenant_id: TenantId, partner_id: PartnerId) -> Result<Partner, LookupError>;
}

impl<D> CustomerDirectory for Arc<D>
where
    D: CustomerDirectory + ?Sized,
{
    fn lookup(&self, tenant_id: TenantId, partner_id: PartnerId) -> Result<Partner, LookupError> {
        (**self).lookup(tenant_id, partner_id)
    }
}

/// In-memory directory for tests/dev. Partners are built by running their
/// commands and kept as snapshots.
#[derive(Debug, Default)]
pub struct InMemoryCustomerDirectory {
    partners: InMemoryTenantStore<PartnerId, Partner>,
}

impl InMemoryCustomerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &self,
        tenant_id: TenantId,
        name: impl Into<String>,
        email: Option<String>,
        customer_rank: u32,
    ) -> Result<Partner, LookupError> {
        let partner_id = PartnerId::new(AggregateId::new());
        let mut partner = Partner::empty(partner_id);
        execute(
            &mut partner,
            &PartnerCommand::RegisterPartner(RegisterPartner {
                tenant_id,
                partner_id,
                name: name.into(),
                email,
                customer_rank,
                occurred_at: Utc::now(),
            }),
        )?;

        self.partners.upsert(tenant_id, partner_id, partner.clone())?;
        Ok(partner)
    }

    pub fn mark_as_customer(&self, tenant_id: TenantId, partner_id: PartnerId) -> Result<Partner, LookupError> {
        self.update(tenant_id, partner_id, |partner_id| {
            PartnerCommand::MarkAsCustomer(MarkAsCustomer {
                tenant_id,
                partner_id,
                occurred_at: Utc::now(),
            })
        })
    }

    pub fn archive(&self, tenant_id: TenantId, partner_id: PartnerId) -> Result<Partner, LookupError> {
        self.update(tenant_id, partner_id, |partner_id| {
            PartnerCommand::ArchivePartner(ArchivePartner {
                tenant_id,
                partner_id,
                occurred_at: Utc::now(),
            })
        })
    }

    fn update(
        &self,
        tenant_id: TenantId,
        partner_id: PartnerId,
        command: impl FnOnce(PartnerId) -> PartnerCommand,
    ) -> Result<Partner, LookupError> {
        let mut partner = self.lookup(tenant_id, partner_id)?;
        execute(&mut partner, &command(partner_id))?;
        self.partners.upsert(tenant_id, partner_id, partner.clone())?;
        Ok(partner)
    }
}

impl CustomerDirectory for InMemoryCustomerDirectory {
    fn lookup(&self, tenant_id: TenantId, partner_id: PartnerId) -> Result<Partner, LookupError> {
        self.partners
            .get(tenant_id, &partner_id)
            .ok_or_else(|| LookupError::not_found("partner", partner_id))
    }
}
