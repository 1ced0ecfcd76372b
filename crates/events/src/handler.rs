/// Run a command against an aggregate in place: decide, then apply.
///
/// No persistence and no publication. Handy for building collaborator
/// aggregates (partners, products) in adapters and tests; the order service
/// has its own commit path.
pub fn execute<A>(aggregate: &mut A, command: &A::Command) -> Result<Vec<A::Event>, A::Error>
where
    A: printshop_core::Aggregate,
{
    let events = A::handle(aggregate, command)?;
    for ev in &events {
        A::apply(aggregate, ev);
    }
    Ok(events)
}
