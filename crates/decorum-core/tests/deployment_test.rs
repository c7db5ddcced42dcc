mod common;

use common::*;
use decorum_core::{
    ClassMetadata, DefinitionError, Deployment, DeploymentError, DeploymentManifest, DelegatePoint,
    Enablement, ScopeDeclaration, StaticMetadata, TargetDescriptor,
};

fn scope(id: &str, decorators: &[&str]) -> ScopeDeclaration {
    ScopeDeclaration {
        id: id.to_string(),
        decorators: decorators.iter().map(|d| d.to_string()).collect(),
    }
}

fn manifest(scopes: Vec<ScopeDeclaration>) -> DeploymentManifest {
    DeploymentManifest {
        scopes,
        ..DeploymentManifest::default()
    }
}

fn scenario_metadata() -> StaticMetadata {
    StaticMetadata::new()
        .with(service_decorator("Db", &[m()]).priority(2000))
        .with(service_decorator("Dd", &[m()]))
        .with(service_decorator("Da", &[m()]).priority(1000))
        .with(service_decorator("Dc", &[m()]))
}

#[test]
fn test_priority_then_declared_order() {
    let deployment = Deployment::bootstrap(
        &scenario_metadata(),
        &manifest(vec![scope("app", &["Dc", "Dd"])]),
        service_hierarchy(),
    )
    .unwrap();

    let chain = deployment
        .resolver()
        .resolve(&TargetDescriptor::new("app", [ty("Service")]));
    assert_eq!(ids(&chain), vec!["Da", "Db", "Dc", "Dd"]);

    let trace = Trace::default();
    let dispatcher = wrapping_dispatcher(chain, &trace);
    assert_eq!(
        dispatcher.enter(&m(), ()).unwrap(),
        "Da(Db(Dc(Dd(target))))"
    );
    assert_eq!(
        recorded(&trace),
        vec!["Da.m", "Db.m", "Dc.m", "Dd.m", "target.m"]
    );
}

#[test]
fn test_global_decorators_precede_declared_ones_in_every_scope() {
    let metadata = StaticMetadata::new()
        .with(service_decorator("G3", &[m()]).priority(3))
        .with(service_decorator("G1", &[m()]).priority(1))
        .with(service_decorator("S1", &[m()]))
        .with(service_decorator("S2", &[m()]))
        .with(service_decorator("S3", &[m()]));
    let deployment = Deployment::bootstrap(
        &metadata,
        &manifest(vec![scope("a", &["S3", "S1"]), scope("b", &["S2"])]),
        service_hierarchy(),
    )
    .unwrap();

    let resolve = |scope: &str| {
        ids(&deployment
            .resolver()
            .resolve(&TargetDescriptor::new(scope, [ty("Service")])))
    };
    assert_eq!(resolve("a"), vec!["G1", "G3", "S3", "S1"]);
    assert_eq!(resolve("b"), vec!["G1", "G3", "S2"]);
    assert_eq!(resolve("c"), vec!["G1", "G3"]);

    for scope in ["a", "b", "c"] {
        let chain = deployment
            .resolver()
            .resolve(&TargetDescriptor::new(scope, [ty("Service")]));
        let first_declared = chain
            .decorators()
            .iter()
            .position(|d| !d.is_global())
            .unwrap_or(chain.len());
        assert!(chain.decorators()[first_declared..]
            .iter()
            .all(|d| !d.is_global()));
    }
}

#[test]
fn test_declared_positions_follow_manifest() {
    let deployment = Deployment::bootstrap(
        &scenario_metadata(),
        &manifest(vec![scope("app", &["Dd", "Dc"])]),
        service_hierarchy(),
    )
    .unwrap();
    let chain = deployment
        .resolver()
        .resolve(&TargetDescriptor::new("app", [ty("Service")]));
    let declared: Vec<_> = chain
        .decorators()
        .iter()
        .filter_map(|d| match d.enablement() {
            Enablement::ScopeDeclared { position, .. } => Some((d.id().to_string(), *position)),
            Enablement::GlobalPriority(_) => None,
        })
        .collect();
    assert_eq!(
        declared,
        vec![("Dd".to_string(), 0), ("Dc".to_string(), 1)]
    );
}

#[test]
fn test_unrelated_target_gets_empty_chain() {
    let mut hierarchy = service_hierarchy();
    hierarchy
        .declare(decorum_types::TypeDecl::interface("Other"))
        .unwrap();
    let deployment =
        Deployment::bootstrap(&scenario_metadata(), &manifest(vec![]), hierarchy).unwrap();

    let chain = deployment
        .resolver()
        .resolve(&TargetDescriptor::new("app", [ty("Other")]));
    assert!(chain.is_empty());

    let trace = Trace::default();
    let dispatcher = wrapping_dispatcher(chain, &trace);
    assert_eq!(dispatcher.enter(&m(), ()).unwrap(), "target");
    assert_eq!(recorded(&trace), vec!["target.m"]);
}

#[test]
fn test_empty_decorated_types_aborts_deployment() {
    let metadata = scenario_metadata().with(
        ClassMetadata::decorator("Broken")
            .delegate(DelegatePoint::new(ty("Service")))
            .priority(1),
    );
    let result = Deployment::bootstrap(&metadata, &manifest(vec![]), service_hierarchy());
    assert!(matches!(
        result,
        Err(DeploymentError::Definition(
            DefinitionError::EmptyDecoratedTypes { .. }
        ))
    ));
}

#[test]
fn test_invalid_scope_declared_decorator_aborts_deployment() {
    let metadata = scenario_metadata().with(
        ClassMetadata::decorator("TwoDelegates")
            .decorates(ty("Service"))
            .delegate(DelegatePoint::new(ty("Service")))
            .delegate(DelegatePoint::new(ty("Service"))),
    );
    let result = Deployment::bootstrap(
        &metadata,
        &manifest(vec![scope("app", &["TwoDelegates"])]),
        service_hierarchy(),
    );
    assert!(matches!(
        result,
        Err(DeploymentError::Definition(
            DefinitionError::MultipleDelegates { count: 2, .. }
        ))
    ));
}

#[test]
fn test_unknown_and_non_decorator_classes() {
    let unknown = Deployment::bootstrap(
        &scenario_metadata(),
        &manifest(vec![scope("app", &["Missing"])]),
        service_hierarchy(),
    );
    assert!(matches!(unknown, Err(DeploymentError::UnknownClass { .. })));

    let metadata = scenario_metadata().with(ClassMetadata::plain("OrderService"));
    let plain = Deployment::bootstrap(
        &metadata,
        &manifest(vec![scope("app", &["OrderService"])]),
        service_hierarchy(),
    );
    assert!(matches!(plain, Err(DeploymentError::NotADecorator { .. })));
}

#[test]
fn test_duplicate_declaration_aborts_deployment() {
    let result = Deployment::bootstrap(
        &scenario_metadata(),
        &manifest(vec![scope("app", &["Dc", "Dd", "Dc"])]),
        service_hierarchy(),
    );
    assert!(matches!(
        result,
        Err(DeploymentError::DuplicateDecorator { .. })
    ));
}

#[test]
fn test_priority_decorator_listed_in_scope_runs_once() {
    let deployment = Deployment::bootstrap(
        &scenario_metadata(),
        &manifest(vec![scope("app", &["Da", "Dc"])]),
        service_hierarchy(),
    )
    .unwrap();
    let chain = deployment
        .resolver()
        .resolve(&TargetDescriptor::new("app", [ty("Service")]));
    assert_eq!(ids(&chain), vec!["Da", "Db", "Dc"]);
}

#[test]
fn test_top_type_must_match_hierarchy() {
    let mut manifest = manifest(vec![]);
    manifest.engine.top_type = "java.lang.Object".to_string();
    let result = Deployment::bootstrap(&scenario_metadata(), &manifest, service_hierarchy());
    assert!(matches!(result, Err(DeploymentError::InvalidManifest(_))));

    let mut hierarchy = manifest.engine.new_hierarchy();
    hierarchy
        .declare(decorum_types::TypeDecl::interface("Service").method(m()).method(n()))
        .unwrap();
    assert!(Deployment::bootstrap(&scenario_metadata(), &manifest, hierarchy).is_ok());
}
