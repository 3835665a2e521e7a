use criterion::{Criterion, black_box, criterion_group, criterion_main};
use razor_fmt::{CancellationToken, FormattingOptions, RazorFormatter};
use razor_fmt_csharp::CSharpFormatter;
use razor_fmt_lsp::RazorFormattingService;
use razor_fmt_syntax::RazorParser;
use serde_json::json;

fn large_document(block_count: usize) -> String {
    let mut out = String::with_capacity(block_count * 160);
    out.push_str("@page \"/bench\"\n@inject   IService   Service\n\n");
    for i in 0..block_count {
        out.push_str(&format!(
            "<div class=\"row\">\n@if (items.Count > {i})\n{{\n<p>@items[{i}].Name</p>\n  var total{i} = items[{i}].Price * 2;\n}}\n</div>\n"
        ));
    }
    out.push_str("@code {\n  private List<Item> items = new();\n  void Add()\n  {\n  items.Add(new Item());\n  }\n}\n");
    out
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

fn bench_document_formatting(c: &mut Criterion) {
    let text = large_document(500);
    let formatter = RazorFormatter::new(RazorParser::new(), CSharpFormatter::new());
    let options = FormattingOptions::default();
    let rt = runtime();

    c.bench_function("format_document/500_blocks", |b| {
        b.iter(|| {
            let outcome = rt
                .block_on(formatter.format_document(
                    black_box(&text),
                    &options,
                    &CancellationToken::new(),
                ))
                .unwrap();
            black_box(outcome.edits().len());
        })
    });
}

fn bench_on_type_request(c: &mut Criterion) {
    let text = large_document(500);
    let service = RazorFormattingService::new();
    let rt = runtime();
    // The `;` closing the first `var total0 = ...;` line.
    let line = text
        .lines()
        .position(|line| line.contains("var total0"))
        .unwrap_or(0);
    let character = text.lines().nth(line).map_or(0, |line| line.len());
    let params = json!({
        "position": { "line": line, "character": character },
        "ch": ";",
        "options": { "tabSize": 4, "insertSpaces": true }
    });

    c.bench_function("on_type_formatting/semicolon", |b| {
        b.iter(|| {
            let result = rt
                .block_on(service.on_type_formatting(
                    black_box(&text),
                    &params,
                    &CancellationToken::new(),
                ))
                .unwrap();
            black_box(result);
        })
    });
}

fn bench_parse(c: &mut Criterion) {
    let text = large_document(500);
    let parser = RazorParser::new();

    c.bench_function("parse/500_blocks", |b| {
        b.iter(|| {
            let (tree, diagnostics) = parser.parse_tree(black_box(&text));
            black_box((tree.root().span(), diagnostics.len()));
        })
    });
}

criterion_group!(
    benches,
    bench_document_formatting,
    bench_on_type_request,
    bench_parse
);
criterion_main!(benches);
