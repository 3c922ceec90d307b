/// Runs `add` for each event in order. If one fails, `remove` is called for
/// every event already added (newest first) and the error is returned, so a
/// partial registration never outlives its callback.
pub fn add_all<E>(
    events: &[&str],
    mut add: impl FnMut(&str) -> Result<(), E>,
    mut remove: impl FnMut(&str),
) -> Result<(), E> {
    for (i, event) in events.iter().enumerate() {
        if let Err(err) = add(event) {
            for added in events[..i].iter().rev() {
                remove(added);
            }
            return Err(err);
        }
    }
    Ok(())
}
