//! Resource state tracking.
//!
//! Each resource stores the state it was last transitioned to. Moving it to a
//! new state emits one barrier; asking for the state it is already in emits
//! nothing. The barriers of one request are returned as a single batch so the
//! caller can record them as one command.

use smallvec::SmallVec;

use crate::resources::{ResourceId, ResourceStore};
use crate::types::ResourceState;

/// A single state transition of one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Barrier {
    pub resource: ResourceId,
    pub before: ResourceState,
    pub after: ResourceState,
}

pub type BarrierBatch = SmallVec<[Barrier; 8]>;

/// Computes the barriers that bring every requested resource into its target
/// state and updates the tracked state as it goes.
///
/// `None` entries are skipped. A resource listed twice is transitioned in
/// order, so the second entry sees the state left by the first.
pub fn plan_transitions<I>(store: &mut ResourceStore, requests: I) -> BarrierBatch
where
    I: IntoIterator<Item = (Option<ResourceId>, ResourceState)>,
{
    let mut barriers = BarrierBatch::new();
    for (resource, after) in requests {
        let Some(resource) = resource else {
            continue;
        };
        let before = store.state(resource);
        if before == after {
            continue;
        }
        store.set_state(resource, after);
        barriers.push(Barrier {
            resource,
            before,
            after,
        });
    }
    barriers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{Texture, TextureDesc};
    use crate::types::{BindFlags, Format};

    fn render_target(store: &mut ResourceStore) -> ResourceId {
        let desc = TextureDesc::new_2d(4, 4, Format::Rgba8Unorm)
            .with_bind_flags(BindFlags::RENDER_TARGET | BindFlags::SHADER_RESOURCE);
        store.insert_texture(Texture::new(desc)).into()
    }

    #[test]
    fn test_same_state_emits_nothing() {
        let mut store = ResourceStore::new();
        let rt = render_target(&mut store);
        let barriers = plan_transitions(&mut store, [(Some(rt), ResourceState::RenderTarget)]);
        assert!(barriers.is_empty());
    }

    #[test]
    fn test_transition_is_idempotent() {
        let mut store = ResourceStore::new();
        let rt = render_target(&mut store);

        let first = plan_transitions(&mut store, [(Some(rt), ResourceState::PixelShaderResource)]);
        let second = plan_transitions(&mut store, [(Some(rt), ResourceState::PixelShaderResource)]);

        assert_eq!(
            first.as_slice(),
            &[Barrier {
                resource: rt,
                before: ResourceState::RenderTarget,
                after: ResourceState::PixelShaderResource,
            }]
        );
        assert!(second.is_empty());
        assert_eq!(store.state(rt), ResourceState::PixelShaderResource);
    }

    #[test]
    fn test_absent_entries_skipped() {
        let mut store = ResourceStore::new();
        let rt = render_target(&mut store);
        let barriers = plan_transitions(
            &mut store,
            [
                (None, ResourceState::CopyDest),
                (Some(rt), ResourceState::CopyDest),
                (None, ResourceState::CopyDest),
            ],
        );
        assert_eq!(barriers.len(), 1);
    }

    #[test]
    fn test_duplicate_entries_chain() {
        let mut store = ResourceStore::new();
        let rt = render_target(&mut store);
        let barriers = plan_transitions(
            &mut store,
            [
                (Some(rt), ResourceState::CopySource),
                (Some(rt), ResourceState::CopySource),
                (Some(rt), ResourceState::PixelShaderResource),
            ],
        );
        assert_eq!(barriers.len(), 2);
        assert_eq!(barriers[1].before, ResourceState::CopySource);
    }
}
