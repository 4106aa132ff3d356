//! Access scoping tests
//!
//! Tests for the actor model:
//! - Managers see and administer only the shops assigned to them
//! - Workers are pinned to a single shop and cannot administer it
//! - Admins bypass shop assignment

use std::collections::HashSet;

use uuid::Uuid;

/// The resolved caller identity, mirroring the request-scoped actor
#[derive(Debug, Clone)]
enum Actor {
    Manager {
        is_admin: bool,
        shop_ids: HashSet<Uuid>,
    },
    Worker {
        shop_id: Uuid,
    },
}

impl Actor {
    fn can_record_for(&self, shop_id: Uuid) -> bool {
        match self {
            Actor::Manager { is_admin, shop_ids } => *is_admin || shop_ids.contains(&shop_id),
            Actor::Worker { shop_id: own } => *own == shop_id,
        }
    }

    fn can_manage(&self, shop_id: Uuid) -> bool {
        match self {
            Actor::Manager { is_admin, shop_ids } => *is_admin || shop_ids.contains(&shop_id),
            Actor::Worker { .. } => false,
        }
    }

    fn visible_shops(&self) -> Option<Vec<Uuid>> {
        match self {
            Actor::Manager { is_admin: true, .. } => None,
            Actor::Manager { shop_ids, .. } => Some(shop_ids.iter().copied().collect()),
            Actor::Worker { shop_id } => Some(vec![*shop_id]),
        }
    }
}

fn manager_of(shops: &[Uuid]) -> Actor {
    Actor::Manager {
        is_admin: false,
        shop_ids: shops.iter().copied().collect(),
    }
}

#[test]
fn test_manager_records_only_in_own_shops() {
    let shop_a = Uuid::new_v4();
    let shop_b = Uuid::new_v4();
    let actor = manager_of(&[shop_a]);

    assert!(actor.can_record_for(shop_a));
    assert!(!actor.can_record_for(shop_b));
}

#[test]
fn test_manager_of_several_shops() {
    let shops: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
    let other = Uuid::new_v4();
    let actor = manager_of(&shops);

    for shop in &shops {
        assert!(actor.can_manage(*shop));
    }
    assert!(!actor.can_manage(other));

    let visible = actor.visible_shops().unwrap();
    assert_eq!(visible.len(), 3);
}

#[test]
fn test_worker_cannot_administer_own_shop() {
    let shop = Uuid::new_v4();
    let actor = Actor::Worker { shop_id: shop };

    assert!(actor.can_record_for(shop));
    assert!(!actor.can_manage(shop));
}

#[test]
fn test_registry_writes_are_manager_only() {
    let shop = Uuid::new_v4();
    let worker = Actor::Worker { shop_id: shop };
    let manager = manager_of(&[shop]);

    // Recording entries is open to workers; creating products in the
    // registry is not, even for their own shop
    assert!(worker.can_record_for(shop));
    assert!(!worker.can_manage(shop));
    assert!(manager.can_manage(shop));
}

#[test]
fn test_worker_sees_only_own_shop() {
    let own = Uuid::new_v4();
    let other = Uuid::new_v4();
    let actor = Actor::Worker { shop_id: own };

    assert_eq!(actor.visible_shops(), Some(vec![own]));
    assert!(!actor.can_record_for(other));
}

#[test]
fn test_admin_is_unrestricted() {
    let actor = Actor::Manager {
        is_admin: true,
        shop_ids: HashSet::new(),
    };
    let anywhere = Uuid::new_v4();

    assert!(actor.can_record_for(anywhere));
    assert!(actor.can_manage(anywhere));
    // None means no shop filter is applied to reads
    assert_eq!(actor.visible_shops(), None);
}

#[test]
fn test_manager_without_shops_sees_nothing() {
    let actor = manager_of(&[]);
    let shop = Uuid::new_v4();

    assert!(!actor.can_record_for(shop));
    assert_eq!(actor.visible_shops(), Some(vec![]));
}

/// Visibility filtering as applied to ledger listings
#[test]
fn test_shop_filter_application() {
    let shop_a = Uuid::new_v4();
    let shop_b = Uuid::new_v4();
    let shop_c = Uuid::new_v4();
    let entries = vec![shop_a, shop_a, shop_b, shop_c, shop_b];

    let actor = manager_of(&[shop_a, shop_b]);
    let visible = actor.visible_shops();

    let filtered: Vec<Uuid> = entries
        .iter()
        .copied()
        .filter(|shop| match &visible {
            None => true,
            Some(shops) => shops.contains(shop),
        })
        .collect();

    assert_eq!(filtered.len(), 4);
    assert!(!filtered.contains(&shop_c));
}
