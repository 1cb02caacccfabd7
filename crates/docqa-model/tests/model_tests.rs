use docqa_core::{Inferencer, ModelSettings};
use docqa_model::{load_model, FakeModel};

#[test]
fn fake_model_picks_the_overlapping_sentence() {
    let context = "The reactor was commissioned in 1972. Its cooling tower is 150 metres tall.\nMaintenance happens every spring.";
    let answer = FakeModel.infer(context, "How tall is the cooling tower?").expect("answer");
    assert_eq!(answer, "Its cooling tower is 150 metres tall.");

    let again = FakeModel.infer(context, "How tall is the cooling tower?").unwrap();
    assert_eq!(answer, again, "deterministic for the same input");
}

#[test]
fn fake_model_admits_when_nothing_matches() {
    let answer = FakeModel.infer("Bananas are yellow.", "Who wrote Hamlet?").unwrap();
    assert!(answer.contains("could not find"));
}

#[test]
fn fake_model_fails_on_blank_context() {
    assert!(FakeModel.infer("   ", "anything?").is_err());
}

#[test]
fn load_model_honours_use_fake() {
    let settings = ModelSettings { use_fake: true, ..ModelSettings::default() };
    let model = load_model(&settings).expect("fake model loads without weights");
    assert!(model.infer("Paris is the capital of France.", "What is the capital of France?").unwrap().contains("Paris"));
}

#[test]
fn weight_files_reads_shard_index() {
    let tmp = tempfile::TempDir::new().unwrap();
    let index = r#"{"weight_map": {"a.weight": "model-00002.safetensors", "b.weight": "model-00001.safetensors", "c.weight": "model-00001.safetensors"}}"#;
    std::fs::write(tmp.path().join("model.safetensors.index.json"), index).unwrap();
    let files = docqa_model::llama::weight_files(tmp.path()).unwrap();
    assert_eq!(files, vec![tmp.path().join("model-00001.safetensors"), tmp.path().join("model-00002.safetensors")]);
}

#[test]
fn weight_files_missing_is_an_error() {
    let tmp = tempfile::TempDir::new().unwrap();
    assert!(docqa_model::llama::weight_files(tmp.path()).is_err());
}

/// Needs real weights; run with
/// `APP_MODEL_DIR=/path/to/llama cargo test -p docqa-model -- --ignored`
#[ignore]
#[test]
fn real_model_answers_from_context() {
    let settings = ModelSettings { max_new_tokens: 32, temperature: 0.0, ..ModelSettings::default() };
    let model = load_model(&settings).expect("model");
    let answer = model.infer("The launch was moved to Thursday.", "When is the launch?").expect("answer");
    assert!(!answer.is_empty());
}
