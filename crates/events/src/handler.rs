/// Execute an aggregate command deterministically (no IO, no async).
///
/// 1. **Decide**: `aggregate.handle(command)` returns events without mutating.
/// 2. **Evolve**: each event is applied via `aggregate.apply(event)`.
///
/// If `handle` rejects the command, the aggregate is left untouched. This is
/// the inline form of the service pipeline, which additionally journals and
/// publishes between the two steps.
pub fn execute<A>(aggregate: &mut A, command: &A::Command) -> Result<Vec<A::Event>, A::Error>
where
    A: coursemart_core::Aggregate,
{
    let events = A::handle(aggregate, command)?;
    for ev in &events {
        A::apply(aggregate, ev);
    }
    Ok(events)
}
