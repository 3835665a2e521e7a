use pretty_assertions::assert_eq;
use razor_fmt::{
    EmbeddedFormatRequest, EmbeddedFormatter, EmbeddedFormatterError, FormattingOptions, MARKER,
};
use razor_fmt_csharp::CSharpFormatter;

const GENERATED: &str = "namespace N\n{\n    public partial class C\n    {\n        public void R()\n        {\n\n  if (a)\n  {\n/**/\n  }\n        }\n    }\n}\n";

#[tokio::test]
async fn formats_through_the_trait() {
    let marker = GENERATED.find(MARKER).unwrap();
    let request = EmbeddedFormatRequest {
        text: GENERATED.to_string(),
        annotations: vec![marker],
        options: FormattingOptions::default(),
    };
    let result = CSharpFormatter::new().format(request).await.unwrap();

    let lines = result.text.lines().collect::<Vec<_>>();
    assert_eq!(lines[7], "            if (a)");
    assert_eq!(lines[8], "            {");
    assert_eq!(lines[9], "                /**/");
    assert_eq!(lines[10], "            }");

    let annotated = result.annotations[0].unwrap();
    let line_start = result.text[..annotated].rfind('\n').map_or(0, |i| i + 1);
    assert_eq!(annotated - line_start, 16);
}

#[tokio::test]
async fn tabs_follow_options() {
    let request = EmbeddedFormatRequest {
        text: "{\n{\nx;\n}\n}".to_string(),
        annotations: Vec::new(),
        options: FormattingOptions::default().with_tabs(),
    };
    let result = CSharpFormatter::new().format(request).await.unwrap();
    assert_eq!(result.text, "{\n\t{\n\t\tx;\n\t}\n}");
}

#[tokio::test]
async fn rejects_zero_tab_size() {
    let request = EmbeddedFormatRequest {
        text: "x;".to_string(),
        annotations: Vec::new(),
        options: FormattingOptions::default().with_tab_size(0),
    };
    let err = CSharpFormatter::new().format(request).await.unwrap_err();
    assert!(matches!(err, EmbeddedFormatterError::Failed(_)));
}
