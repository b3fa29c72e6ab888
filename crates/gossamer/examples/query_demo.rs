//! Build a small synthetic page and run a few selectors against it.
//!
//! Run with `RUST_LOG=info cargo run --example query_demo` (info is the
//! default filter).

use anyhow::Result;
use gossamer::{Document, find_all, select_first};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut doc = Document::new();
    let body = doc.create_element("body");
    doc.set_root(body);

    let div = doc.create_element("div");
    doc.set_attribute(div, "data-region", "intro")?;
    doc.append_child(body, div)?;

    let heading = doc.create_element("h1");
    let heading_text = doc.create_text("Gossamer");
    doc.append_child(heading, heading_text)?;
    doc.append_child(div, heading)?;

    let first = doc.create_element("p");
    doc.set_id(first, "lead")?;
    let first_text = doc.create_text("A document you can query without a browser.");
    doc.append_child(first, first_text)?;
    doc.append_child(div, first)?;

    let second = doc.create_element("p");
    doc.add_class(second, "fine-print")?;
    let second_text = doc.create_text("Second paragraph.");
    doc.append_child(second, second_text)?;
    doc.append_child(div, second)?;

    log::info!("page: {}", doc.to_html(body));

    for selector in ["div>p", "h1+p", ".fine-print", "[data-region=\"intro\"] p"] {
        let hits = find_all(&doc, selector)?;
        log::info!("{selector:?} matched {} element(s)", hits.len());
        for hit in hits {
            log::info!("  -> {}", doc.to_html(hit));
        }
    }

    if let Some(lead) = select_first(&doc, "#lead")? {
        log::info!("lead paragraph text: {:?}", doc.text_content(lead));
    }

    Ok(())
}
