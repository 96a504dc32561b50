use searus_scripts::prelude::*;
use serde_json::{json, Map, Value};

fn registry(settings: ScriptSettings) -> ScriptRegistry {
  NativeScriptPlugin::new(settings).registry().unwrap()
}

fn params(value: Value) -> ScriptParams {
  serde_json::from_value(value).unwrap()
}

#[test]
fn test_split_transform_over_indexed_documents() {
  let registry = registry(ScriptSettings::default());
  let comma = registry
    .new_script("split_transform", Some(&params(json!({ "field": "strcomma" }))))
    .unwrap();
  let dash = registry
    .new_script(
      "split_transform",
      Some(&params(json!({ "field": "strdash", "delimiter": "-" }))),
    )
    .unwrap();

  let mut str_comma = String::new();
  let mut str_dash = String::new();
  let mut indexed: Vec<Map<String, Value>> = Vec::new();
  for i in 0..100 {
    if i != 0 {
      str_comma.push(',');
      str_dash.push('-');
    }
    str_comma.push_str(&i.to_string());
    str_dash.push_str(&i.to_string());

    let mut source = Map::new();
    source.insert("strcomma".into(), json!(str_comma));
    source.insert("strdash".into(), json!(str_dash));
    source.insert("num".into(), json!(i));
    comma.as_transform().unwrap().transform(&mut source);
    dash.as_transform().unwrap().transform(&mut source);
    indexed.push(source);
  }

  for source in &indexed {
    let num = source["num"].as_u64().unwrap() as usize;
    let expected_len = num + 1;
    for field in ["strcomma", "strdash"] {
      match &source[field] {
        Value::Array(values) => assert_eq!(values.len(), expected_len),
        Value::String(s) => {
          assert_eq!(expected_len, 1);
          assert_eq!(s, "0");
        }
        other => panic!("unexpected value {other}"),
      }
    }
  }

  // A term filter on "5" matches every document whose list contains it.
  let hits = indexed
    .iter()
    .filter(|source| match &source["strdash"] {
      Value::Array(values) => values.contains(&json!("5")),
      Value::String(s) => s == "5",
      _ => false,
    })
    .count();
  assert_eq!(hits, 95);
}

#[test]
fn test_score_factor_over_hits() {
  let registry = registry(ScriptSettings::default());
  assert!(registry.script("score_factor").unwrap().needs_scores());
  let script = registry
    .new_script("score_factor", Some(&params(json!({ "factor": 4.0 }))))
    .unwrap();
  let search = script.as_search().unwrap();

  for (i, score) in [0.25f32, 1.0, 3.5].into_iter().enumerate() {
    let doc = Document::new().with_field("id", i);
    let value = search.run(ScriptHit::new(&doc).with_score(score)).unwrap();
    let scaled = value.as_f64().unwrap();
    assert!((scaled - score as f64 * 4.0).abs() < 0.01);
  }
}

#[test]
fn test_is_prime_filters_documents() {
  let registry = registry(ScriptSettings::default().prime_default_field("number"));
  assert!(!registry.script("is_prime").unwrap().needs_scores());
  let script = registry.new_script("is_prime", None).unwrap();
  let search = script.as_search().unwrap();

  let docs: Vec<Document> = (0..100)
    .map(|i| Document::new().with_field("number", i))
    .collect();
  let primes = docs
    .iter()
    .filter(|doc| search.run(ScriptHit::new(*doc)).unwrap() == json!(true))
    .count();
  assert_eq!(primes, 25);
}

#[test]
fn test_is_prime_requires_a_field() {
  let registry = registry(ScriptSettings::default());
  let err = match registry.new_script("is_prime", None) {
    Err(err) => err,
    Ok(_) => panic!("is_prime without a field should be rejected"),
  };
  assert!(err.is_config_error());
}

#[test]
fn test_settings_from_json() {
  let settings = ScriptSettings::from_json(r#"{ "prime": { "default_field_name": "n" } }"#).unwrap();
  let registry = registry(settings);
  let script = registry.new_script("is_prime", None).unwrap();
  let doc = Document::new().with_field("n", 97);
  assert_eq!(
    script.as_search().unwrap().run(ScriptHit::new(&doc)).unwrap(),
    json!(true)
  );
}

#[test]
fn test_profit_through_engine() {
  let engine = AggregationEngine::builder()
    .with_plugin(NativeScriptPlugin::default())
    .build()
    .unwrap();

  let shards = vec![
    vec![
      json!({ "type": "sale", "amount": 80 }),
      json!({ "type": "cost", "amount": 10 }),
    ],
    vec![
      json!({ "type": "cost", "amount": 30 }),
      json!({ "type": "sale", "amount": 130 }),
    ],
  ]
  .into_iter()
  .map(|shard| {
    shard
      .into_iter()
      .filter_map(Document::from_value)
      .collect::<Vec<_>>()
  })
  .collect::<Vec<_>>();

  let report = engine.aggregate("profit", None, &shards).unwrap();
  assert_eq!(report.value, json!(170.0));
  assert_eq!(report.documents(), 4);
  assert_eq!(report.skipped(), 0);
}
