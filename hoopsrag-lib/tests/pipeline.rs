use std::time::Duration;

use hoopsrag_lib::config::{Config, EmbeddingBackend};
use hoopsrag_lib::embed::HashingEmbedder;
use hoopsrag_lib::generate::{AnswerGenerator, OpenAiGenerator, PromptTemplate};
use hoopsrag_lib::normalize::{normalize, NormalizedDocument, TurkishTemplate};
use hoopsrag_lib::record::RawTable;
use hoopsrag_lib::search::Retriever;
use hoopsrag_lib::session::Session;
use hoopsrag_lib::store::VectorStore;
use mockito::Matcher;
use serde_json::json;

const TATUM: &str = "Player;Tm;Data;Opp;MP;PTS;TRB;AST;STL;BLK;FG%\n\
    Jayson Tatum;BOS;2024-01-01;NYK;35;30;8;5;1;1;0.500\n";

const GAMES: &str = "Player ;Tm; Data;Opp;MP;PTS;TRB;AST;STL;BLK;FG% \n\
    Jayson Tatum;BOS;2024-01-01;NYK;35;30;8;5;1;1;0.500\n\
    Jaylen Brown;BOS;2024-01-01;NYK;36;24;6;3;2;0;0.476\n\
    Luka Doncic;DAL;2024-01-26;ATL;44;73;10;7;1;0;0.767\n\
    Nikola Jokic;DEN;2024-01-05;BKN;;28;11;9;1;1;0.600\n\
    Joel Embiid;PHI;2024-01-22;SAS;37;seventy;18;5;1;1;0.708\n\
    Anthony Edwards;MIN;2024-01-10;OKC;38;44;7;5;2;0;0.551\n";

fn documents(csv: &str) -> Vec<NormalizedDocument> {
    let table = RawTable::from_bytes(csv.as_bytes(), b';').unwrap();
    normalize(&table, &TurkishTemplate, true).documents
}

fn completion(content: &str) -> String {
    json!({
        "choices": [{
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop",
        }],
    })
    .to_string()
}

#[test]
fn test_tatum_row_end_to_end() {
    let docs = documents(TATUM);
    assert_eq!(docs.len(), 1);
    assert!(docs[0].text.contains("Jayson Tatum"));
    assert!(docs[0].text.contains("30"));
    assert!(docs[0].text.contains("50.0%"));

    let games = documents(GAMES);
    assert_eq!(games.len(), 4);
    let mut retriever = Retriever::new(HashingEmbedder::default());
    let index = retriever.build(&games).unwrap();
    let results = retriever.search(&index, "Jayson Tatum kaç sayı attı?", 1).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].document.text, docs[0].text);

    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/chat/completions")
        .match_body(Matcher::Regex("Jayson Tatum \\(BOS\\)".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion("Jayson Tatum bu maçta 30 sayı attı."))
        .create();

    let generator = OpenAiGenerator::new(server.url(), "sk-test", "gpt-4o-mini", Duration::from_secs(5)).unwrap();
    let mut answers = AnswerGenerator::new(generator, PromptTemplate::TURKISH);
    let context: Vec<_> = results.into_iter().map(|r| r.document).collect();
    let answer = answers.answer(&context, "Jayson Tatum kaç sayı attı?").unwrap();

    mock.assert();
    assert!(answer.contains("30"));
}

#[test]
fn test_malformed_rows_do_not_abort_the_batch() {
    let table = RawTable::from_bytes(GAMES.as_bytes(), b';').unwrap();
    let normalized = normalize(&table, &TurkishTemplate, false);

    let players: Vec<_> = normalized
        .documents
        .iter()
        .map(|d| d.text.split(" (").next().unwrap().to_string())
        .collect();
    assert_eq!(
        players,
        vec!["Jayson Tatum", "Jaylen Brown", "Luka Doncic", "Anthony Edwards"]
    );

    let skipped: Vec<_> = normalized.skipped.iter().map(|s| s.row).collect();
    assert_eq!(skipped, vec![4, 5]);
}

#[test]
fn test_result_count_is_bounded() {
    let docs = documents(GAMES);
    let mut retriever = Retriever::new(HashingEmbedder::default());
    let index = retriever.build(&docs).unwrap();

    for k in [0, 1, 2, 4, 10] {
        let results = retriever.search(&index, "sayı attı", k).unwrap();
        assert!(results.len() <= k);
        assert!(results.len() <= index.len());
        assert_eq!(results.len(), k.min(index.len()));
    }
}

#[test]
fn test_query_matching_two_documents_returns_both() {
    let docs = vec![
        NormalizedDocument::new("Jayson Tatum Boston Celtics forvet", None),
        NormalizedDocument::new("Jaylen Brown Boston Celtics forvet", None),
        NormalizedDocument::new("Hava bugün yağmurlu", None),
    ];
    let mut retriever = Retriever::new(HashingEmbedder::default());
    let index = retriever.build(&docs).unwrap();

    let results = retriever.search(&index, "Boston Celtics forvet", 2).unwrap();
    let texts: Vec<_> = results.iter().map(|r| r.document.text.as_str()).collect();
    assert!(texts.contains(&docs[0].text.as_str()));
    assert!(texts.contains(&docs[1].text.as_str()));
}

#[test]
fn test_rebuilding_gives_identical_rankings() {
    let docs = documents(GAMES);
    let mut first = Retriever::new(HashingEmbedder::default());
    let mut second = Retriever::new(HashingEmbedder::default());

    let a = first.build(&docs).unwrap();
    let b = second.build(&docs).unwrap();

    let query = "Luka Doncic kaç sayı attı?";
    assert_eq!(
        first.search(&a, query, 4).unwrap(),
        second.search(&b, query, 4).unwrap()
    );
}

#[test]
fn test_empty_index_returns_nothing() {
    let mut retriever = Retriever::new(HashingEmbedder::default());
    let index = retriever.build(&[]).unwrap();

    for query in ["Jayson Tatum kaç sayı attı?", "", "?"] {
        assert!(retriever.search(&index, query, 5).unwrap().is_empty());
    }
}

#[test]
fn test_session_with_configured_backends() {
    let dir = tempfile::tempdir().unwrap();
    let data_path = dir.path().join("nba_fantasy_dataset.csv");
    std::fs::write(&data_path, GAMES).unwrap();

    let mut server = mockito::Server::new();
    let _mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer sk-test")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion("Luka Doncic 73 sayı attı."))
        .create();

    let mut config = Config::from_toml_str(&format!(
        r#"
        data_path = "{}"
        top_k = 2

        [embedding]
        backend = "hashing"

        [generation]
        api_base = "{}"
        api_key = "sk-test"

        [cache]
        dir = "{}"
        "#,
        data_path.display(),
        server.url(),
        dir.path().join("cache").display(),
    ))
    .unwrap();
    config.validate().unwrap();
    assert_eq!(config.embedding.backend, EmbeddingBackend::Hashing);

    let mut session = Session::start(config).unwrap();
    assert_eq!(session.documents().len(), 4);
    assert_eq!(session.skipped().len(), 2);

    let reply = session.ask("Luka Doncic kaç sayı attı?", None).unwrap();
    assert_eq!(reply.sources.len(), 2);
    assert!(reply.sources[0].document.text.starts_with("Luka Doncic"));
    assert_eq!(reply.answer, "Luka Doncic 73 sayı attı.");
}
