use oasref_core::{
    Classification, DocumentRegistry, IndexConfig, Node, NodeKind, ReferenceIndex,
    ResolvingErrorKind, Resolver, Scalar, SpecIndex,
};
use oasref_core::config::DEFAULT_MAX_JOURNEY_DEPTH;
use pretty_assertions::assert_eq;
use serde_json::json;

const CIRCULAR: &str = include_str!("fixtures/circular-tests.yaml");
const BURGERSHOP: &str = include_str!("fixtures/burgershop.yaml");

fn at<'a>(node: &'a Node, path: &[&str]) -> &'a Node {
    path.iter().fold(node, |n, key| {
        n.get(key)
            .unwrap_or_else(|| panic!("missing key '{}' in path {:?}", key, path))
    })
}

fn at_mut<'a>(node: &'a mut Node, path: &[&str]) -> &'a mut Node {
    path.iter().fold(node, |n, key| {
        n.get_mut(key)
            .unwrap_or_else(|| panic!("missing key '{}' in path {:?}", key, path))
    })
}

fn tree_depth(node: &Node) -> usize {
    match &node.kind {
        NodeKind::Scalar(_) => 0,
        NodeKind::Mapping(entries) => {
            1 + entries.iter().map(|e| tree_depth(&e.value)).max().unwrap_or(0)
        }
        NodeKind::Sequence(items) => 1 + items.iter().map(tree_depth).max().unwrap_or(0),
    }
}

fn chain_document(links: usize, leaf_first: bool) -> String {
    let mut order: Vec<usize> = (0..=links).collect();
    if leaf_first {
        order.reverse();
    }
    let mut yml = String::from("components:\n  schemas:\n");
    for i in order {
        if i == links {
            yml.push_str(&format!("    S{i}:\n      type: string\n"));
        } else {
            yml.push_str(&format!(
                "    S{i}:\n      properties:\n        next:\n          $ref: '#/components/schemas/S{}'\n",
                i + 1
            ));
        }
    }
    yml
}

fn journey_paths(resolver: &Resolver<'_>) -> Vec<String> {
    resolver
        .circular_references()
        .iter()
        .map(|c| c.journey_path())
        .collect()
}

#[test]
fn test_resolve_circular_document() {
    let index = SpecIndex::from_yaml_str(CIRCULAR).unwrap();
    let mut resolver = Resolver::new(&index);

    let cycles = resolver.resolve();
    assert_eq!(cycles.len(), 4);

    assert_eq!(
        journey_paths(&resolver),
        vec![
            "One -> Two -> Three -> One",
            "Ten -> Nine -> Ten",
            "Node -> Node",
            "Animal -> Pet -> Animal",
        ]
    );
    assert_eq!(resolver.non_polymorphic_circular_errors().len(), 2);
    assert_eq!(resolver.polymorphic_circular_errors().len(), 2);
    assert_eq!(resolver.circular_errors().len(), 2);
    assert_eq!(resolver.resolving_errors().len(), 2);

    let resolved = resolver.resolved_root().unwrap();
    assert!(resolved.to_yaml_string().is_ok());
}

#[test]
fn test_check_for_circular_references_matches_resolve() {
    let index = SpecIndex::from_yaml_str(CIRCULAR).unwrap();

    let mut checker = Resolver::new(&index);
    let checked: Vec<String> = checker
        .check_for_circular_references()
        .iter()
        .map(|c| c.journey_path())
        .collect();
    assert_eq!(checked.len(), 4);
    assert_eq!(checker.resolving_errors().len(), 2);
    assert_eq!(checker.circular_errors().len(), 2);
    assert!(checker.resolved_root().is_none());

    let mut resolver = Resolver::new(&index);
    resolver.resolve();
    assert_eq!(journey_paths(&resolver), checked);
}

#[test]
fn test_cycle_provenance() {
    let index = SpecIndex::from_yaml_str(CIRCULAR).unwrap();
    let mut resolver = Resolver::new(&index);
    resolver.resolve();

    let first = &resolver.circular_references()[0];
    assert_eq!(first.classification, Classification::NonPolymorphic);
    assert_eq!(first.start.definition, "#/components/schemas/One");
    assert_eq!(first.loop_point.path, "/components/schemas/Three/properties/one");
    assert_eq!(first.location().map(|l| l.line), Some(33));

    let error = resolver.circular_errors()[0];
    assert_eq!(error.kind, ResolvingErrorKind::CircularReference);
    assert_eq!(
        error.friendly_path(),
        "$.components.schemas.Three.properties.one"
    );
    assert!(error.circular.is_some());
    assert!(error.message.contains("One -> Two -> Three -> One"));

    let animal = &resolver.circular_references()[3];
    assert!(animal.is_polymorphic());
    assert_eq!(animal.context.to_string(), "allOf");
}

#[test]
fn test_circular_references_stay_as_markers() {
    let index = SpecIndex::from_yaml_str(CIRCULAR).unwrap();
    let mut resolver = Resolver::new(&index);
    resolver.resolve();
    let resolved = resolver.resolved_root().unwrap();

    let schema = at(
        resolved,
        &[
            "paths",
            "/burgers",
            "get",
            "responses",
            "200",
            "content",
            "application/json",
            "schema",
        ],
    );
    assert_eq!(
        schema.to_json_value(),
        json!({
            "type": "object",
            "required": ["two"],
            "properties": {
                "two": {
                    "type": "object",
                    "properties": {
                        "three": {
                            "type": "object",
                            "properties": {
                                "one": {"$ref": "#/components/schemas/One"}
                            }
                        }
                    }
                }
            }
        })
    );
}

#[test]
fn test_burgershop_has_no_cycles_and_no_markers() {
    let index = SpecIndex::from_yaml_str(BURGERSHOP).unwrap();
    let mut resolver = Resolver::new(&index);

    assert!(resolver.resolve().is_empty());
    assert!(resolver.resolving_errors().is_empty());

    let resolved = resolver.resolved_root().unwrap();
    assert_eq!(resolved.count_references(), 0);

    let sauce = at(
        resolved,
        &["components", "schemas", "Burger", "properties", "sauces", "items"],
    );
    assert_eq!(
        sauce.to_json_value(),
        json!({"oneOf": [{"type": "string"}, {"type": "string"}]})
    );

    let not_found = at(
        resolved,
        &["paths", "/burgers/{burgerId}", "get", "responses", "404"],
    );
    assert_eq!(
        at(not_found, &["content", "application/json", "schema", "properties", "message"])
            .to_json_value(),
        json!({"type": "string"})
    );
}

#[test]
fn test_substituted_copies_are_not_aliased() {
    let index = SpecIndex::from_yaml_str(BURGERSHOP).unwrap();
    let mut resolver = Resolver::new(&index);
    resolver.resolve();
    let mut resolved = resolver.into_resolved_root().unwrap();

    let post = [
        "paths",
        "/burgers",
        "post",
        "responses",
        "200",
        "content",
        "application/json",
        "schema",
    ];
    let get = [
        "paths",
        "/burgers/{burgerId}",
        "get",
        "responses",
        "200",
        "content",
        "application/json",
        "schema",
    ];
    assert_eq!(at(&resolved, &post), at(&resolved, &get));

    let mut post_type_path = post.to_vec();
    post_type_path.push("type");
    let post_type = at_mut(&mut resolved, &post_type_path);
    post_type.kind = NodeKind::Scalar(Scalar::String("mutated".into()));

    assert_eq!(at(&resolved, &post).get("type").unwrap().as_str(), Some("mutated"));
    assert_eq!(at(&resolved, &get).get("type").unwrap().as_str(), Some("object"));
    // the index's frozen target is untouched as well
    let frozen = index.lookup("#/components/schemas/Burger").unwrap();
    assert_eq!(
        frozen.target.as_ref().unwrap().get("type").unwrap().as_str(),
        Some("object")
    );
}

#[test]
fn test_polymorphic_non_circular_reference() {
    let yml = r#"paths:
  /hey:
    get:
      responses:
        "200":
          $ref: '#/components/schemas/crackers'
components:
  schemas:
    cheese:
      description: cheese
      anyOf:
        items:
          $ref: '#/components/schemas/crackers'
    crackers:
      description: crackers
      allOf:
       - $ref: '#/components/schemas/tea'
    tea:
      description: tea"#;

    let index = SpecIndex::from_yaml_str(yml).unwrap();
    let mut resolver = Resolver::new(&index);
    assert!(resolver.check_for_circular_references().is_empty());
    assert!(resolver.resolving_errors().is_empty());
}

#[test]
fn test_three_node_cycle_without_composition() {
    let yml = r#"components:
  schemas:
    a:
      properties:
        b:
          $ref: '#/components/schemas/b'
    b:
      properties:
        c:
          $ref: '#/components/schemas/c'
    c:
      properties:
        a:
          $ref: '#/components/schemas/a'"#;

    let index = SpecIndex::from_yaml_str(yml).unwrap();
    let mut resolver = Resolver::new(&index);
    let cycles = resolver.resolve();
    assert_eq!(cycles.len(), 1);
    assert_eq!(cycles[0].classification, Classification::NonPolymorphic);
    assert_eq!(resolver.circular_errors().len(), 1);
    assert_eq!(
        resolver.circular_errors()[0].circular.as_ref().unwrap().journey.len(),
        4
    );
}

#[test]
fn test_deep_reference_chain_terminates() {
    let index = SpecIndex::from_yaml_str(&chain_document(250, false)).unwrap();
    let mut resolver = Resolver::new(&index);
    assert!(resolver.resolve().is_empty());

    let errors = resolver.resolving_errors();
    assert!(!errors.is_empty());
    assert!(errors
        .iter()
        .all(|e| e.kind == ResolvingErrorKind::DepthExceeded));

    let mut checker = Resolver::new(&index);
    assert!(checker.check_for_circular_references().is_empty());
    assert_eq!(checker.resolving_errors().len(), errors.len());
}

#[test]
fn test_deep_chain_listed_leaf_first_is_bounded() {
    for links in [250, 3000] {
        let index = SpecIndex::from_yaml_str(&chain_document(links, true)).unwrap();
        let mut resolver = Resolver::new(&index);
        assert!(resolver.resolve().is_empty());

        let errors = resolver.resolving_errors();
        assert!(!errors.is_empty(), "no depth error for {} links", links);
        assert!(errors
            .iter()
            .all(|e| e.kind == ResolvingErrorKind::DepthExceeded));

        // reused expansions obey the same bound as walked ones
        let depth = tree_depth(resolver.resolved_root().unwrap());
        assert!(
            depth <= 2 * DEFAULT_MAX_JOURNEY_DEPTH + 8,
            "resolved tree is {} levels deep for {} links",
            depth,
            links
        );

        let mut checker = Resolver::new(&index);
        assert!(checker.check_for_circular_references().is_empty());
        assert_eq!(checker.resolving_errors().len(), errors.len());
    }
}

#[test]
fn test_broken_references_do_not_stop_siblings() {
    let yml = r#"components:
  schemas:
    Broken:
      properties:
        missing:
          $ref: '#/components/schemas/Nope'
        external:
          $ref: 'elsewhere.yaml#/Thing'
        anchor:
          $ref: '#Thing'
        fine:
          $ref: '#/components/schemas/Fine'
    Fine:
      type: string"#;

    let index = SpecIndex::from_yaml_str(yml).unwrap();
    let mut resolver = Resolver::new(&index);
    resolver.resolve();

    let kinds: Vec<ResolvingErrorKind> =
        resolver.resolving_errors().iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ResolvingErrorKind::MissingReference,
            ResolvingErrorKind::UnknownDocument,
            ResolvingErrorKind::MalformedReference,
        ]
    );
    let missing = &resolver.resolving_errors()[0];
    assert_eq!(missing.path, "/components/schemas/Broken/properties/missing");
    assert_eq!(missing.location.map(|l| l.line), Some(6));

    let broken = at(
        resolver.resolved_root().unwrap(),
        &["components", "schemas", "Broken", "properties"],
    );
    assert_eq!(broken.get("fine").unwrap().to_json_value(), json!({"type": "string"}));
    assert!(broken.get("missing").unwrap().is_reference());
}

#[test]
fn test_external_documents_resolve_and_cycle() {
    let mut registry = DocumentRegistry::new();
    registry
        .register_yaml(
            "common.yaml",
            r#"Error:
  type: object
  properties:
    code:
      $ref: '#/Code'
    cause:
      $ref: '#/Error'
Code:
  type: integer
"#,
        )
        .unwrap();
    let root = Node::from_yaml_str(
        r#"components:
  schemas:
    Problem:
      $ref: 'common.yaml#/Error'
"#,
    )
    .unwrap();
    let index = SpecIndex::new(root, IndexConfig::with_base_uri("api.yaml"), registry);
    let mut resolver = Resolver::new(&index);

    let cycles = resolver.resolve();
    assert_eq!(cycles.len(), 1);
    assert_eq!(cycles[0].start.definition, "common.yaml#/Error");
    assert_eq!(cycles[0].loop_point.document, "common.yaml");
    assert_eq!(cycles[0].journey_path(), "Error -> Error");

    let problem = at(
        resolver.resolved_root().unwrap(),
        &["components", "schemas", "Problem"],
    );
    assert_eq!(
        problem.to_json_value(),
        json!({
            "type": "object",
            "properties": {
                "code": {"type": "integer"},
                "cause": {"$ref": "common.yaml#/Error"}
            }
        })
    );
}

#[test]
fn test_external_markers_keep_their_document() {
    let mut registry = DocumentRegistry::new();
    registry
        .register_yaml(
            "common.yaml",
            r#"Error:
  properties:
    cause:
      $ref: '#/Error'
    detail:
      $ref: '#/Nope'
"#,
        )
        .unwrap();
    let root = Node::from_yaml_str(
        r#"Error:
  type: string
Problem:
  $ref: 'common.yaml#/Error'
"#,
    )
    .unwrap();
    let index = SpecIndex::new(root, IndexConfig::with_base_uri("api.yaml"), registry);
    let mut resolver = Resolver::new(&index);
    resolver.resolve();

    let kinds: Vec<ResolvingErrorKind> =
        resolver.resolving_errors().iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ResolvingErrorKind::MissingReference,
            ResolvingErrorKind::CircularReference,
        ]
    );

    let resolved = resolver.resolved_root().unwrap();
    let problem = at(resolved, &["Problem", "properties"]);
    assert_eq!(
        problem.get("cause").unwrap().reference_value(),
        Some("common.yaml#/Error")
    );
    assert_eq!(
        problem.get("detail").unwrap().reference_value(),
        Some("common.yaml#/Nope")
    );
    assert_eq!(at(resolved, &["Error"]).to_json_value(), json!({"type": "string"}));
}

#[test]
fn test_classification_is_deterministic() {
    let index = SpecIndex::from_yaml_str(CIRCULAR).unwrap();
    let runs: Vec<(Vec<String>, usize, usize)> = (0..3)
        .map(|_| {
            let mut resolver = Resolver::new(&index);
            resolver.resolve();
            (
                journey_paths(&resolver),
                resolver.polymorphic_circular_errors().len(),
                resolver.non_polymorphic_circular_errors().len(),
            )
        })
        .collect();
    assert_eq!(runs[0], runs[1]);
    assert_eq!(runs[1], runs[2]);

    // repeated passes on one resolver start fresh
    let mut resolver = Resolver::new(&index);
    resolver.resolve();
    resolver.resolve();
    assert_eq!(resolver.circular_references().len(), 4);
    assert_eq!(resolver.resolving_errors().len(), 2);
}

#[test]
fn test_parallel_resolvers_share_an_index() {
    let index = SpecIndex::from_yaml_str(CIRCULAR).unwrap();
    let counts: Vec<usize> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    let mut resolver = Resolver::new(&index);
                    resolver.resolve().len()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert_eq!(counts, vec![4, 4, 4, 4]);
}

#[test]
fn test_round_trip_keeps_content_and_order() {
    let yml = r#"openapi: 3.0.0
info:
  title: Round trip
  version: v1
paths:
  /pets:
    get:
      responses:
        default:
          description: pets
          content:
            application/json:
              schema:
                $ref: '#/components/schemas/Pet'
components:
  schemas:
    Pet:
      type: object
      properties:
        name:
          type: string
        age:
          type: integer
"#;
    let index = SpecIndex::from_yaml_str(yml).unwrap();
    let mut resolver = Resolver::new(&index);
    assert!(resolver.resolve().is_empty());
    let resolved = resolver.resolved_root().unwrap();

    let keys: Vec<&str> = resolved
        .entries()
        .unwrap()
        .iter()
        .map(|e| e.key.as_str())
        .collect();
    assert_eq!(keys, vec!["openapi", "info", "paths", "components"]);

    let reparsed = Node::from_yaml_str(&resolved.to_yaml_string().unwrap()).unwrap();
    assert_eq!(reparsed.to_json_value(), resolved.to_json_value());
    assert_eq!(
        at(&reparsed, &["components", "schemas", "Pet"]).to_json_value(),
        json!({
            "type": "object",
            "properties": {"name": {"type": "string"}, "age": {"type": "integer"}}
        })
    );
    let schema = at(
        &reparsed,
        &["paths", "/pets", "get", "responses", "default", "content", "application/json", "schema"],
    );
    let props: Vec<&str> = schema
        .get("properties")
        .unwrap()
        .entries()
        .unwrap()
        .iter()
        .map(|e| e.key.as_str())
        .collect();
    assert_eq!(props, vec!["name", "age"]);
    assert_eq!(index.all_references().len(), 1);
}
