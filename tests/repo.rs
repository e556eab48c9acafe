use modwire::{
    BuildContext, CheckHealth, Context, HealthErrorKind, Inject, InjectValue, InstantiateErrorKind, Module, ModuleKey, Repo,
    ResolveErrorKind,
};
use std::sync::{
    atomic::{AtomicBool, AtomicU8, Ordering},
    Arc,
};

struct DatabaseUrl(&'static str);

struct Db {
    url: &'static str,
    online: Arc<AtomicBool>,
}

impl CheckHealth for Db {
    fn check_health(&self, _context: &Context) -> anyhow::Result<()> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(anyhow::anyhow!("{} is offline", self.url))
        }
    }
}

struct Cache(Arc<Db>);

struct Users {
    db: Arc<Db>,
    cache: Arc<Cache>,
}

const DB: Module<Db> = Module::named("db");
const CACHE: Module<Cache> = Module::named("cache");
const USERS: Module<Users> = Module::named("users");

fn repo(online: &Arc<AtomicBool>, users_call_count: &Arc<AtomicU8>) -> Repo {
    let online = online.clone();
    let users_call_count = users_call_count.clone();

    Repo::new()
        .provide(DB.provide_checked(move |ctx: &BuildContext| {
            let url = ctx.context().get::<DatabaseUrl>().ok_or(InstantiateErrorKind::NoContextValue("DatabaseUrl"))?;
            Ok::<_, InstantiateErrorKind>(Db {
                url: url.0,
                online: online.clone(),
            })
        }))
        .provide(CACHE.provide_with(|Inject(db): Inject<Db>| Ok::<_, InstantiateErrorKind>(Cache(db))))
        .provide(USERS.provide(move |ctx: &BuildContext| {
            users_call_count.fetch_add(1, Ordering::SeqCst);
            Ok::<_, InstantiateErrorKind>(Users {
                db: DB.get(ctx)?,
                cache: CACHE.get(ctx)?,
            })
        }))
}

#[test]
fn test_inject_and_lookup() {
    let online = Arc::new(AtomicBool::new(true));
    let users_call_count = Arc::new(AtomicU8::new(0));
    let repo = repo(&online, &users_call_count);

    let context = repo.inject_to(Context::new().with(DatabaseUrl("postgres://localhost"))).unwrap();

    let users = USERS.value(&context).unwrap();
    assert_eq!(users.db.url, "postgres://localhost");
    assert!(Arc::ptr_eq(&users.db, &users.cache.0));
    assert_eq!(context.dependencies(&USERS.key()).unwrap().len(), 2);

    let other = repo.inject_to(Context::new()).unwrap();
    assert!(Arc::ptr_eq(&USERS.value(&other).unwrap(), &users));
    assert!(other.get::<DatabaseUrl>().is_none());
    assert_eq!(users_call_count.load(Ordering::SeqCst), 1);
}

#[test]
fn test_missing_context_value() {
    let online = Arc::new(AtomicBool::new(true));
    let users_call_count = Arc::new(AtomicU8::new(0));

    let err = repo(&online, &users_call_count).build().unwrap_err();

    assert_eq!(err.key(), DB.key());
    assert_eq!(err.to_string(), "creating with module db: value DatabaseUrl not found in context");
    assert!(matches!(err.instantiate_error(), Some(InstantiateErrorKind::NoContextValue("DatabaseUrl"))));
}

#[test]
fn test_missing_provider() {
    struct Mailer;

    let repo = Repo::new().provide(Module::<Mailer>::new().provide_with(|InjectValue(_): InjectValue<DatabaseUrl>, Inject(_): Inject<Db>| {
        Ok::<_, InstantiateErrorKind>(Mailer)
    }));

    let err = repo.inject_to(Context::new().with(DatabaseUrl("postgres://localhost"))).unwrap_err();

    let ResolveErrorKind::NoProvider { key, requested_by } = err else {
        panic!("missing provider should be reported");
    };
    assert_eq!(key, DB.key());
    assert_eq!(requested_by, Some(ModuleKey::of::<Mailer>()));
}

#[test]
fn test_health_cascade() {
    let online = Arc::new(AtomicBool::new(true));
    let users_call_count = Arc::new(AtomicU8::new(0));
    let repo = repo(&online, &users_call_count);

    let context = repo.inject_to(Context::new().with(DatabaseUrl("postgres://localhost"))).unwrap();
    assert!(context.check_all_health().values().all(Result::is_ok));

    online.store(false, Ordering::SeqCst);
    let report = context.check_health(&[USERS.key()]);

    assert_eq!(report.len(), 3);
    assert_eq!(report[&DB.key()].as_ref().unwrap_err().to_string(), "postgres://localhost is offline");
    assert!(matches!(&report[&CACHE.key()], Err(HealthErrorKind::Dependency { dependency }) if *dependency == DB.key()));
    assert!(report[&USERS.key()].as_ref().unwrap_err().is_dependency_failure());
}
