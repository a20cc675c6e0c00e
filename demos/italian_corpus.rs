//! Index the two-document Italian corpus and run the classic queries,
//! printing ranked hits and score explanations.
//!
//! Run with `RUST_LOG=ricerca=debug` to see build and query logging.

use ricerca::{
    BoolQuery, Config, Document, FieldConfig, Query, SearchOptions, Searcher, Similarity,
};
use tracing_subscriber::EnvFilter;

fn main() -> ricerca::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::default()
        .with_field("titolo", FieldConfig::whitespace())
        .with_field("contenuto", FieldConfig::standard().with_stopwords(["in", "dei", "di"]))
        .with_field("data", FieldConfig::keyword());
    let searcher = Searcher::new(config)?;

    let report = searcher.build(vec![
        Document::new()
            .with_field("titolo", "Come diventare un ingegnere dei dati, Data Engineer?")
            .with_field("contenuto", "Sembra che oggigiorno tutti vogliano diventare un Data Scientist  ...")
            .with_field("data", "12 ottobre 2016"),
        Document::new()
            .with_field("titolo", "Curriculum Ingegneria dei Dati - Sezione di Informatica e Automazione")
            .with_field("contenuto", "Curriculum. Ingegneria dei Dati. Laurea Magistrale in Ingegneria Informatica ..."),
    ])?;
    println!("indexed {} document(s) in {:?}", report.documents_indexed, report.elapsed);

    for field in ["titolo", "contenuto", "data"] {
        println!("{}", serde_json::to_string(&searcher.collection_statistics(field)?)?);
    }

    println!("\n== titolo:Ingegneria");
    print!("{}", searcher.search_query(&Query::term("titolo", "Ingegneria"))?);

    println!("\n== contenuto:\"data scientist\"");
    print!("{}", searcher.search_query(&Query::phrase("contenuto", ["data", "scientist"]))?);

    println!("\n== titolo:Ingegneria OR contenuto:\"data scientist\"");
    let either: Query = BoolQuery::new()
        .with_should(Query::term("titolo", "Ingegneria"))
        .with_should(Query::phrase("contenuto", ["data", "scientist"]))
        .into();
    print!("{}", searcher.search_query(&either)?);

    println!("\n== +ingegneria dei +dati");
    print!("{}", searcher.search("contenuto", "+ingegneria dei +dati")?);

    println!("\n== data:\"12 ottobre 2016\"");
    print!("{}", searcher.search("data", "\"12 ottobre 2016\"")?);

    println!("\n== *:*");
    print!("{}", searcher.search_query(&Query::MatchAll)?);

    let index = searcher.snapshot()?;
    let multi = ricerca::query::parser::QueryParser::new("contenuto", &index.schema)
        .parse_multi_field(&[("contenuto", 1.0), ("titolo", 1.0)], "ingegneria dati data scientist")?;
    let similarities = [
        Similarity::TfIdf,
        Similarity::Bm25 { k1: 2.5, b: 0.2 },
        Similarity::LmJelinekMercer { lambda: 0.1 },
    ];
    for similarity in similarities {
        println!("\n== {} using {:?}", multi, similarity);
        let options = SearchOptions::new(10).with_explain(true).with_similarity(similarity);
        print!("{}", searcher.search_with(&multi, &options)?);
    }

    match searcher.search("contenuto", "\"data scientist") {
        Ok(_) => println!("unexpected success"),
        Err(err) => println!("\n{}", err),
    }

    Ok(())
}
