use crate::{CommitEvent, Observer, Registry, Scope, SyncOp, SyncOpts, Writer};
use maplit::btreemap;
use netguard_core::{
    AddressGroup, AddressGroupBinding, Error, Network, ResourceIdentifier, Service, ServiceAlias,
};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};
use tokio_util::sync::CancellationToken;

struct TestRegistry {
    registry: Registry,
    ctx: CancellationToken,
    _tracing: tracing::subscriber::DefaultGuard,
}

impl TestRegistry {
    fn new() -> Self {
        let _tracing = tracing::subscriber::set_default(
            tracing_subscriber::fmt()
                .with_test_writer()
                .with_max_level(tracing::Level::TRACE)
                .finish(),
        );
        Self {
            registry: Registry::new(),
            ctx: CancellationToken::new(),
            _tracing,
        }
    }

    fn writer(&self) -> Writer {
        self.registry.writer(&self.ctx).expect("writer must open")
    }

    fn commit_services(&self, services: Vec<Service>, scope: &Scope, op: SyncOp) {
        let mut writer = self.writer();
        writer
            .sync(&self.ctx, services, scope, op.into())
            .expect("sync must stage");
        writer.commit().expect("commit must publish");
    }

    fn list_services(&self) -> Vec<Service> {
        let reader = self.registry.reader(&self.ctx).expect("reader must open");
        let mut services = Vec::new();
        reader
            .list::<Service, _>(&self.ctx, &Scope::Empty, |service| {
                services.push(service);
                Ok(())
            })
            .expect("list must succeed");
        services.sort_by_key(|service| service.self_ref.clone());
        services
    }

    fn get_service(&self, id: &ResourceIdentifier) -> Result<Service, Error> {
        self.registry
            .reader(&self.ctx)
            .expect("reader must open")
            .get_by_id::<Service>(&self.ctx, id)
    }
}

fn service(namespace: &str, name: &str) -> Service {
    Service::new(ResourceIdentifier::new(namespace, name))
}

fn address_group(namespace: &str, name: &str) -> AddressGroup {
    AddressGroup::new(ResourceIdentifier::new(namespace, name))
}

#[test]
fn upsert_fills_metadata() {
    let test = TestRegistry::new();

    let mut web = service("default", "web");
    web.description = "frontend".to_string();
    web.meta.labels = btreemap! {
        "team".to_string() => "edge".to_string(),
    };
    test.commit_services(vec![web.clone()], &Scope::Empty, SyncOp::Upsert);

    let stored = test
        .get_service(&web.self_ref)
        .expect("web.default must exist");
    assert!(!stored.meta.uid.is_empty(), "uid must be assigned");
    assert!(
        stored.meta.creation_timestamp.is_some(),
        "creation timestamp must be assigned"
    );
    assert_eq!(stored.meta.generation, 1);
    assert!(
        !stored.meta.resource_version.is_empty(),
        "resource version must be assigned"
    );
    assert_eq!(stored.description, "frontend");
    assert_eq!(stored.meta.labels, web.meta.labels);
}

#[test]
fn update_preserves_uid_and_creation_timestamp() {
    let test = TestRegistry::new();
    test.commit_services(vec![service("default", "web")], &Scope::Empty, SyncOp::Upsert);
    let created = test
        .get_service(&ResourceIdentifier::new("default", "web"))
        .expect("web.default must exist");

    // The update carries zeroed metadata; identity must survive anyway.
    let mut update = service("default", "web");
    update.description = "updated".to_string();
    test.commit_services(vec![update], &Scope::Empty, SyncOp::Upsert);

    let updated = test
        .get_service(&ResourceIdentifier::new("default", "web"))
        .expect("web.default must exist");
    assert_eq!(updated.meta.uid, created.meta.uid);
    assert_eq!(
        updated.meta.creation_timestamp,
        created.meta.creation_timestamp
    );
    assert_eq!(updated.meta.generation, 2, "spec change must bump generation");
    assert_eq!(updated.description, "updated");
}

#[test]
fn unchanged_spec_keeps_generation() {
    let test = TestRegistry::new();
    test.commit_services(vec![service("default", "web")], &Scope::Empty, SyncOp::Upsert);
    test.commit_services(vec![service("default", "web")], &Scope::Empty, SyncOp::Upsert);

    let stored = test
        .get_service(&ResourceIdentifier::new("default", "web"))
        .expect("web.default must exist");
    assert_eq!(stored.meta.generation, 1);
}

#[test]
fn resource_versions_increase_across_commits() {
    let test = TestRegistry::new();
    test.commit_services(vec![service("default", "web")], &Scope::Empty, SyncOp::Upsert);
    let first: i64 = test
        .get_service(&ResourceIdentifier::new("default", "web"))
        .expect("web.default must exist")
        .meta
        .resource_version
        .parse()
        .expect("versions are numeric");

    test.commit_services(vec![service("default", "web")], &Scope::Empty, SyncOp::Upsert);
    let second: i64 = test
        .get_service(&ResourceIdentifier::new("default", "web"))
        .expect("web.default must exist")
        .meta
        .resource_version
        .parse()
        .expect("versions are numeric");

    assert!(second > first, "{second} must exceed {first}");
}

#[test]
fn full_sync_with_empty_scope_replaces_the_kind() {
    let test = TestRegistry::new();
    test.commit_services(
        vec![service("default", "web"), service("default", "db")],
        &Scope::Empty,
        SyncOp::Upsert,
    );

    test.commit_services(vec![service("default", "api")], &Scope::Empty, SyncOp::FullSync);

    let services = test.list_services();
    assert_eq!(services.len(), 1);
    assert_eq!(services[0].self_ref, ResourceIdentifier::new("default", "api"));
}

#[test]
fn full_sync_with_scope_preserves_out_of_scope_records() {
    let test = TestRegistry::new();
    test.commit_services(
        vec![service("default", "web"), service("default", "db")],
        &Scope::Empty,
        SyncOp::Upsert,
    );
    let db_before = test
        .get_service(&ResourceIdentifier::new("default", "db"))
        .expect("db.default must exist");

    let mut update = service("default", "web");
    update.description = "Updated".to_string();
    test.commit_services(
        vec![update],
        &Scope::from(ResourceIdentifier::new("default", "web")),
        SyncOp::FullSync,
    );

    let services = test.list_services();
    assert_eq!(services.len(), 2);
    let web = test
        .get_service(&ResourceIdentifier::new("default", "web"))
        .expect("web.default must exist");
    assert_eq!(web.description, "Updated");
    let db_after = test
        .get_service(&ResourceIdentifier::new("default", "db"))
        .expect("db.default must exist");
    assert_eq!(db_after, db_before, "out-of-scope record must be untouched");
}

#[test]
fn full_sync_with_scope_deletes_in_scope_absentees() {
    let test = TestRegistry::new();
    test.commit_services(
        vec![service("default", "web"), service("default", "db")],
        &Scope::Empty,
        SyncOp::Upsert,
    );

    test.commit_services(
        vec![],
        &Scope::from(ResourceIdentifier::new("default", "web")),
        SyncOp::FullSync,
    );

    let services = test.list_services();
    assert_eq!(services.len(), 1);
    assert_eq!(services[0].self_ref, ResourceIdentifier::new("default", "db"));
}

#[test]
fn full_sync_namespace_identifier_never_deletes() {
    let test = TestRegistry::new();
    test.commit_services(vec![service("default", "web")], &Scope::Empty, SyncOp::Upsert);

    test.commit_services(
        vec![],
        &Scope::from(ResourceIdentifier::new("default", "")),
        SyncOp::FullSync,
    );

    assert_eq!(test.list_services().len(), 1);
}

#[test]
fn upsert_never_removes() {
    let test = TestRegistry::new();
    test.commit_services(
        vec![service("default", "web"), service("default", "db")],
        &Scope::Empty,
        SyncOp::Upsert,
    );

    test.commit_services(vec![service("default", "api")], &Scope::Empty, SyncOp::Upsert);

    assert_eq!(test.list_services().len(), 3);
}

#[test]
fn delete_removes_exactly_the_given_keys() {
    let test = TestRegistry::new();
    test.commit_services(
        vec![service("default", "web"), service("default", "db")],
        &Scope::Empty,
        SyncOp::Upsert,
    );

    // One existing key, one missing key; the latter must be a no-op.
    test.commit_services(
        vec![service("default", "web"), service("default", "ghost")],
        &Scope::Empty,
        SyncOp::Delete,
    );

    let services = test.list_services();
    assert_eq!(services.len(), 1);
    assert_eq!(services[0].self_ref, ResourceIdentifier::new("default", "db"));
}

#[test]
fn delete_by_ids_ignores_missing_keys() {
    let test = TestRegistry::new();
    test.commit_services(vec![service("default", "web")], &Scope::Empty, SyncOp::Upsert);

    let mut writer = test.writer();
    writer
        .delete_by_ids::<Service>(
            &test.ctx,
            &[
                ResourceIdentifier::new("default", "web"),
                ResourceIdentifier::new("default", "ghost"),
            ],
        )
        .expect("deleting a missing key must not error");
    writer.commit().expect("commit must publish");

    assert!(test.list_services().is_empty());
}

#[test]
fn commits_publish_all_touched_kinds_atomically() {
    let test = TestRegistry::new();

    let mut writer = test.writer();
    writer
        .sync(
            &test.ctx,
            vec![service("default", "web")],
            &Scope::Empty,
            SyncOpts::default(),
        )
        .expect("services must stage");
    writer
        .sync(
            &test.ctx,
            vec![address_group("default", "ag")],
            &Scope::Empty,
            SyncOpts::default(),
        )
        .expect("address groups must stage");

    // A reader opened before the commit must keep seeing the old state of
    // every kind.
    let before = test.registry.reader(&test.ctx).expect("reader must open");
    writer.commit().expect("commit must publish");

    let mut seen = 0;
    before
        .list::<Service, _>(&test.ctx, &Scope::Empty, |_| {
            seen += 1;
            Ok(())
        })
        .expect("list must succeed");
    before
        .list::<AddressGroup, _>(&test.ctx, &Scope::Empty, |_| {
            seen += 1;
            Ok(())
        })
        .expect("list must succeed");
    assert_eq!(seen, 0, "pre-commit reader must see no staged kind");

    let after = test.registry.reader(&test.ctx).expect("reader must open");
    after
        .get_by_id::<Service>(&test.ctx, &ResourceIdentifier::new("default", "web"))
        .expect("web.default must be visible");
    after
        .get_by_id::<AddressGroup>(&test.ctx, &ResourceIdentifier::new("default", "ag"))
        .expect("ag.default must be visible");
}

#[test]
fn abort_discards_staged_writes() {
    let test = TestRegistry::new();

    let mut writer = test.writer();
    writer
        .sync(
            &test.ctx,
            vec![service("default", "web")],
            &Scope::Empty,
            SyncOpts::default(),
        )
        .expect("sync must stage");
    writer.abort();

    assert!(test.list_services().is_empty());
}

#[test]
fn overlay_reader_prefers_staged_kinds() {
    let test = TestRegistry::new();
    test.commit_services(vec![service("default", "web")], &Scope::Empty, SyncOp::Upsert);

    let mut writer = test.writer();
    writer
        .sync(
            &test.ctx,
            vec![service("default", "api")],
            &Scope::Empty,
            SyncOp::Upsert.into(),
        )
        .expect("sync must stage");
    writer
        .sync(
            &test.ctx,
            vec![address_group("default", "ag")],
            &Scope::Empty,
            SyncOp::Upsert.into(),
        )
        .expect("sync must stage");

    let overlay = test
        .registry
        .reader_from_writer(&test.ctx, &writer)
        .expect("overlay reader must open");
    overlay
        .get_by_id::<Service>(&test.ctx, &ResourceIdentifier::new("default", "api"))
        .expect("staged service must be visible");
    overlay
        .get_by_id::<Service>(&test.ctx, &ResourceIdentifier::new("default", "web"))
        .expect("committed service must remain visible through the overlay");
    overlay
        .get_by_id::<AddressGroup>(&test.ctx, &ResourceIdentifier::new("default", "ag"))
        .expect("staged address group must be visible");

    // Nothing is committed yet.
    drop(overlay);
    writer.abort();
    let committed = test.registry.reader(&test.ctx).expect("reader must open");
    assert!(matches!(
        committed.get_by_id::<AddressGroup>(&test.ctx, &ResourceIdentifier::new("default", "ag")),
        Err(Error::NotFound { .. })
    ));
}

#[test]
fn service_projection_follows_bindings() {
    let test = TestRegistry::new();

    let svc = ResourceIdentifier::new("default", "web");
    let ag = ResourceIdentifier::new("default", "ag");
    let mut writer = test.writer();
    // Derived field on the way in must be discarded.
    let mut incoming = Service::new(svc.clone());
    incoming.address_groups = vec![ResourceIdentifier::new("default", "bogus")];
    writer
        .sync(&test.ctx, vec![incoming], &Scope::Empty, SyncOpts::default())
        .expect("sync must stage");
    writer
        .sync(
            &test.ctx,
            vec![AddressGroup::new(ag.clone())],
            &Scope::Empty,
            SyncOpts::default(),
        )
        .expect("sync must stage");
    writer.commit().expect("commit must publish");

    let before_binding = test.get_service(&svc).expect("web.default must exist");
    assert!(
        before_binding.address_groups.is_empty(),
        "projection must come from bindings, not from the written record"
    );

    let mut writer = test.writer();
    writer
        .sync(
            &test.ctx,
            vec![AddressGroupBinding::new(
                ResourceIdentifier::new("default", "web-ag"),
                svc.clone(),
                ag.clone(),
            )],
            &Scope::Empty,
            SyncOpts::default(),
        )
        .expect("sync must stage");
    writer.commit().expect("commit must publish");

    let bound = test.get_service(&svc).expect("web.default must exist");
    assert_eq!(bound.address_groups, vec![ag]);
}

#[test]
fn namespace_scope_lists_whole_namespace() {
    let test = TestRegistry::new();
    test.commit_services(
        vec![
            service("default", "web"),
            service("default", "db"),
            service("prod", "web"),
        ],
        &Scope::Empty,
        SyncOp::Upsert,
    );

    let reader = test.registry.reader(&test.ctx).expect("reader must open");
    let mut names = Vec::new();
    reader
        .list::<Service, _>(
            &test.ctx,
            &Scope::from(ResourceIdentifier::new("default", "")),
            |svc| {
                names.push(svc.self_ref.name);
                Ok(())
            },
        )
        .expect("list must succeed");
    names.sort();
    assert_eq!(names, vec!["db", "web"]);
}

#[test]
fn listing_stops_after_namespace_identifier() {
    let test = TestRegistry::new();
    test.commit_services(
        vec![service("default", "web"), service("prod", "web")],
        &Scope::Empty,
        SyncOp::Upsert,
    );

    let reader = test.registry.reader(&test.ctx).expect("reader must open");
    let mut seen = Vec::new();
    reader
        .list::<Service, _>(
            &test.ctx,
            &Scope::by_identifiers([
                ResourceIdentifier::new("default", ""),
                ResourceIdentifier::new("prod", "web"),
            ]),
            |svc| {
                seen.push(svc.self_ref);
                Ok(())
            },
        )
        .expect("list must succeed");
    assert_eq!(seen, vec![ResourceIdentifier::new("default", "web")]);
}

#[test]
fn get_network_by_cidr_matches_equivalent_spellings() {
    let test = TestRegistry::new();
    let mut writer = test.writer();
    writer
        .sync(
            &test.ctx,
            vec![Network::new(
                ResourceIdentifier::new("default", "lan"),
                "10.20.0.0/16",
            )],
            &Scope::Empty,
            SyncOpts::default(),
        )
        .expect("sync must stage");
    writer.commit().expect("commit must publish");

    let reader = test.registry.reader(&test.ctx).expect("reader must open");
    let network = reader
        .get_network_by_cidr(&test.ctx, "10.20.0.0/16")
        .expect("exact spelling must match");
    assert_eq!(network.self_ref, ResourceIdentifier::new("default", "lan"));

    assert!(matches!(
        reader.get_network_by_cidr(&test.ctx, "10.99.0.0/16"),
        Err(Error::NotFound { .. })
    ));
}

#[test]
fn commit_updates_sync_status_and_notifies() {
    #[derive(Default)]
    struct Recorder {
        commits: AtomicUsize,
        last: Mutex<Option<CommitEvent>>,
    }

    impl Observer for Recorder {
        fn on_commit(&self, event: &CommitEvent) {
            self.commits.fetch_add(1, Ordering::SeqCst);
            *self.last.lock().expect("lock") = Some(*event);
        }
    }

    let test = TestRegistry::new();
    let recorder = Arc::new(Recorder::default());
    let id = test.registry.subject().subscribe(recorder.clone());

    test.commit_services(vec![service("default", "web")], &Scope::Empty, SyncOp::Upsert);
    assert_eq!(recorder.commits.load(Ordering::SeqCst), 1);

    let status = test
        .registry
        .reader(&test.ctx)
        .expect("reader must open")
        .get_sync_status(&test.ctx)
        .expect("status must read");
    let event = recorder
        .last
        .lock()
        .expect("lock")
        .expect("event must be recorded");
    assert_eq!(event.updated_at, status.updated_at);

    test.registry.subject().unsubscribe(id);
    test.commit_services(vec![service("default", "db")], &Scope::Empty, SyncOp::Upsert);
    assert_eq!(recorder.commits.load(Ordering::SeqCst), 1);
}

#[test]
fn close_rejects_new_readers_and_writers() {
    let test = TestRegistry::new();
    test.commit_services(vec![service("default", "web")], &Scope::Empty, SyncOp::Upsert);

    let survivor = test.registry.reader(&test.ctx).expect("reader must open");
    let doomed = test.writer();

    test.registry.close();
    test.registry.close();

    assert!(matches!(
        test.registry.reader(&test.ctx),
        Err(Error::RegistryClosed)
    ));
    assert!(matches!(
        test.registry.writer(&test.ctx),
        Err(Error::RegistryClosed)
    ));
    assert!(matches!(doomed.commit(), Err(Error::RegistryClosed)));

    // A reader opened before the close keeps its snapshot.
    survivor
        .get_by_id::<Service>(&test.ctx, &ResourceIdentifier::new("default", "web"))
        .expect("pre-close snapshot must remain readable");
}

#[test]
fn reader_from_writer_rejects_foreign_writers() {
    let test = TestRegistry::new();
    let other = Registry::new();
    let writer = other.writer(&test.ctx).expect("writer must open");

    assert!(matches!(
        test.registry.reader_from_writer(&test.ctx, &writer),
        Err(Error::ForeignWriter)
    ));
}

#[test]
fn cancellation_stops_reads_and_writes() {
    let test = TestRegistry::new();
    test.commit_services(vec![service("default", "web")], &Scope::Empty, SyncOp::Upsert);

    let cancelled = CancellationToken::new();
    cancelled.cancel();

    let reader = test.registry.reader(&test.ctx).expect("reader must open");
    assert!(matches!(
        reader.list::<Service, _>(&cancelled, &Scope::Empty, |_| Ok(())),
        Err(Error::Cancelled)
    ));

    let mut writer = test.writer();
    assert!(matches!(
        writer.sync(
            &cancelled,
            vec![service("default", "api")],
            &Scope::Empty,
            SyncOpts::default(),
        ),
        Err(Error::Cancelled)
    ));
    writer.abort();

    // Staged state was unaffected; the committed view still has one record.
    assert_eq!(test.list_services().len(), 1);
}

#[test]
fn consume_errors_abort_listing() {
    let test = TestRegistry::new();
    test.commit_services(
        vec![service("default", "web"), service("default", "db")],
        &Scope::Empty,
        SyncOp::Upsert,
    );

    let reader = test.registry.reader(&test.ctx).expect("reader must open");
    let mut seen = 0;
    let result = reader.list::<Service, _>(&test.ctx, &Scope::Empty, |svc| {
        seen += 1;
        Err(Error::ShapeInvalid {
            kind: "Service",
            id: svc.self_ref.key(),
            field: "description",
            reason: "stop".to_string(),
        })
    });
    assert!(matches!(result, Err(Error::ShapeInvalid { .. })));
    assert_eq!(seen, 1, "listing must stop at the first consume error");
}

#[test]
fn aliases_survive_service_full_sync() {
    // Kinds are independent: a full sync of services must not disturb
    // other kinds' maps.
    let test = TestRegistry::new();
    let mut writer = test.writer();
    writer
        .sync(
            &test.ctx,
            vec![service("default", "web")],
            &Scope::Empty,
            SyncOpts::default(),
        )
        .expect("sync must stage");
    writer
        .sync(
            &test.ctx,
            vec![ServiceAlias::new(
                ResourceIdentifier::new("default", "web-alias"),
                ResourceIdentifier::new("default", "web"),
            )],
            &Scope::Empty,
            SyncOpts::default(),
        )
        .expect("sync must stage");
    writer.commit().expect("commit must publish");

    test.commit_services(vec![], &Scope::Empty, SyncOp::FullSync);

    let reader = test.registry.reader(&test.ctx).expect("reader must open");
    reader
        .get_by_id::<ServiceAlias>(&test.ctx, &ResourceIdentifier::new("default", "web-alias"))
        .expect("alias must survive a service-kind full sync");
    assert!(test.list_services().is_empty());
}
