use crate::areas::database::Database;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::remote::{Remote, RemoteError};
use bytes::Bytes;
use std::collections::HashMap;

enum Step {
    Visit(ObjectId),
    Store(ObjectId),
}

/// Copy every object reachable from `tips` into `database`
///
/// Objects are inserted in dependency post-order: a commit or tree is stored
/// only after everything it references, so the database never holds a
/// dangling reference even if the transfer stops partway. Objects already
/// present are not fetched, nor is anything below them.
///
/// Returns the number of objects fetched.
pub async fn fetch_closure(
    remote: &dyn Remote,
    database: &Database,
    tips: impl IntoIterator<Item = ObjectId>,
) -> Result<usize, RemoteError> {
    let mut stack = tips.into_iter().map(Step::Visit).collect::<Vec<_>>();
    let mut pending = HashMap::<ObjectId, Bytes>::new();
    let mut fetched = 0;

    while let Some(step) = stack.pop() {
        match step {
            Step::Visit(oid) => {
                if pending.contains_key(&oid) || database.contains(&oid).map_err(storage)? {
                    continue;
                }

                let object_content = remote.fetch_object(&oid).await?;
                let actual = ObjectId::hash_bytes(&object_content);
                if actual != oid {
                    return Err(RemoteError::Transfer(format!(
                        "object {oid} is corrupt: content hashes to {actual}"
                    )));
                }

                let object = Database::parse_raw(&object_content).map_err(|err| {
                    RemoteError::Transfer(format!("object {oid} is malformed: {err:#}"))
                })?;
                fetched += 1;

                stack.push(Step::Store(oid.clone()));
                stack.extend(object.references().into_iter().map(Step::Visit));
                pending.insert(oid, object_content);
            }
            Step::Store(oid) => {
                if let Some(object_content) = pending.remove(&oid) {
                    database.store_raw(&oid, object_content).map_err(storage)?;
                }
            }
        }
    }

    tracing::debug!(remote = remote.location(), objects = fetched, "transfer complete");

    Ok(fetched)
}

fn storage(err: anyhow::Error) -> RemoteError {
    RemoteError::Transfer(format!("{err:#}"))
}
