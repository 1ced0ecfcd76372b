//! Partner directory domain module (event-sourced).
//!
//! Partners are the people and companies an order can be placed for. Pure
//! domain logic: no IO, no storage.

pub mod partner;

pub use partner::{
    ArchivePartner, CustomerRankIncreased, MarkAsCustomer, Partner, PartnerArchived,
    PartnerCommand, PartnerEvent, PartnerId, PartnerRegistered, RegisterPartner,
};
