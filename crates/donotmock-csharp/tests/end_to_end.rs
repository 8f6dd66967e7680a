//! Integration test: C# sources through the full analyzer.

use donotmock_core::{
    AnalysisResult, Analyzer, Config, Diagnostic, Severity, SourceFile, MESSAGE_PROPERTY, RULE_ID,
};
use donotmock_csharp::CSharpFrontEnd;
use std::path::{Path, PathBuf};

fn fixture_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/shop")
}

fn analyzer_with(config: Config) -> Analyzer {
    Analyzer::builder()
        .root(".")
        .config(config)
        .front_end(CSharpFrontEnd::new())
        .build()
        .expect("analyzer should build")
}

fn check(sources: &[(&str, &str)]) -> AnalysisResult {
    check_with(Config::default(), sources)
}

fn check_with(config: Config, sources: &[(&str, &str)]) -> AnalysisResult {
    let sources = sources
        .iter()
        .map(|(path, content)| SourceFile::new(*path, *content))
        .collect();
    analyzer_with(config)
        .analyze_sources(sources)
        .expect("analysis should succeed")
}

fn only(result: &AnalysisResult) -> &Diagnostic {
    assert_eq!(result.diagnostics.len(), 1, "{:#?}", result.diagnostics);
    &result.diagnostics[0]
}

const MARKED_SERVICE: &str = r#"using DoNotMock;

namespace App
{
    [DoNotMock("Use FakeService")]
    public interface IService { }

    public interface IPlain { }
}
"#;

#[test]
fn mock_construction_of_marked_type() {
    let tests = r"using Moq;
using App;

class ServiceTests
{
    void Run()
    {
        var mock = new Mock<IService>();
    }
}
";
    let result = check(&[("Service.cs", MARKED_SERVICE), ("ServiceTests.cs", tests)]);
    let diagnostic = only(&result);

    assert_eq!(diagnostic.rule_id, RULE_ID);
    assert_eq!(diagnostic.severity, Severity::Error);
    assert!(diagnostic.message.contains("App.IService"));
    assert_eq!(diagnostic.property(MESSAGE_PROPERTY), Some("Use FakeService"));
    assert_eq!(diagnostic.location.file, Path::new("ServiceTests.cs"));
    assert_eq!(diagnostic.location.line, 8);
    assert_eq!(result.files_checked, 2);
    assert_eq!(result.nodes_evaluated, 1);
}

#[test]
fn unmarked_type_is_allowed() {
    let tests = "using Moq;\nusing App;\nclass T { object M() => new Mock<IPlain>(); }\n";
    let result = check(&[("Service.cs", MARKED_SERVICE), ("T.cs", tests)]);
    assert!(result.diagnostics.is_empty());
    assert_eq!(result.nodes_evaluated, 1);
}

#[test]
fn factory_call_reports_the_call_span() {
    let tests = "using NSubstitute;\nusing App;\nclass T\n{\n    object M() => Substitute.For<IService>();\n}\n";
    let result = check(&[("Service.cs", MARKED_SERVICE), ("T.cs", tests)]);
    let diagnostic = only(&result);

    let location = &diagnostic.location;
    assert_eq!(location.line, 5);
    assert_eq!(location.column, 19);
    assert_eq!(
        &tests[location.offset..location.offset + location.length],
        "Substitute.For<IService>()"
    );
}

#[test]
fn inherited_marker_names_the_requested_type() {
    let contracts = r#"using DoNotMock;
namespace App
{
    [DoNotMock("Use FakeBaseService")]
    public interface IBaseService { }
    public interface IService : IBaseService { }
}
"#;
    let tests = "using Moq;\nusing App;\nclass T { object M() => new Mock<IService>(); }\n";
    let result = check(&[("Contracts.cs", contracts), ("T.cs", tests)]);
    let diagnostic = only(&result);

    assert!(diagnostic.message.contains("'App.IService'"));
    assert!(!diagnostic.message.contains("IBaseService"));
    assert_eq!(diagnostic.property(MESSAGE_PROPERTY), Some("Use FakeBaseService"));
}

#[test]
fn diamond_reports_once() {
    let contracts = r#"using DoNotMock;
namespace App
{
    [DoNotMock("root")] public interface IRoot { }
    public interface ILeft : IRoot { }
    public interface IRight : IRoot { }
    public interface IBoth : ILeft, IRight { }
}
"#;
    let tests = "using Moq;\nusing App;\nclass T { object M() => new Mock<IBoth>(); }\n";
    let result = check(&[("Contracts.cs", contracts), ("T.cs", tests)]);
    assert_eq!(only(&result).property(MESSAGE_PROPERTY), Some("root"));
}

#[test]
fn base_class_marker_wins_over_interface_marker() {
    let contracts = r#"using DoNotMock;
namespace App
{
    [DoNotMock("from interface")] public interface IMarked { }
    [DoNotMock("from base")] public class ServiceBase { }
    public class Service : ServiceBase, IMarked { }
}
"#;
    let tests = "using Moq;\nusing App;\nclass T { object M() => new Mock<Service>(); }\n";
    let result = check(&[("Contracts.cs", contracts), ("T.cs", tests)]);
    assert_eq!(only(&result).property(MESSAGE_PROPERTY), Some("from base"));
}

#[test]
fn own_marker_wins_over_inherited() {
    let contracts = r#"using DoNotMock;
namespace App
{
    [DoNotMock("from base")] public interface IBase { }
    [DoNotMock("own")] public interface IService : IBase { }
}
"#;
    let tests = "using Moq;\nusing App;\nclass T { object M() => new Mock<IService>(); }\n";
    let result = check(&[("Contracts.cs", contracts), ("T.cs", tests)]);
    assert_eq!(only(&result).property(MESSAGE_PROPERTY), Some("own"));
}

#[test]
fn marker_without_message_has_no_property() {
    let contracts = "using DoNotMock;\nnamespace App { [DoNotMock] public interface IService { } }\n";
    let tests = "using Moq;\nusing App;\nclass T { object M() => new Mock<IService>(); }\n";
    let result = check(&[("Contracts.cs", contracts), ("T.cs", tests)]);
    assert!(only(&result).property(MESSAGE_PROPERTY).is_none());
}

#[test]
fn lookalikes_are_silent() {
    let tests = r"using App;
namespace Other { public class Mock<T> { } }
namespace App.Tests
{
    using Other;
    class T
    {
        object A() => new Mock<IService>();
        object B() => new Moq.Mock<IService, IPlain>();
        object C() => new Moq.Mock<IMissing>();
        object D() => NSubstitute.Substitute.Received<IService>();
    }
}
";
    let result = check(&[("Service.cs", MARKED_SERVICE), ("T.cs", tests)]);
    assert!(result.diagnostics.is_empty(), "{:#?}", result.diagnostics);
    assert_eq!(result.nodes_evaluated, 4);
}

#[test]
fn partial_types_collect_markers_from_every_part() {
    let first = "namespace App { public partial interface IService { } }\n";
    let second = "using DoNotMock;\nnamespace App { [DoNotMock(\"partial\")] public partial interface IService { } }\n";
    let tests = "using Moq;\nusing App;\nclass T { object M() => new Mock<IService>(); }\n";
    let result = check(&[("A.cs", first), ("B.cs", second), ("T.cs", tests)]);
    assert_eq!(only(&result).property(MESSAGE_PROPERTY), Some("partial"));
}

#[test]
fn aliases_static_and_global_usings() {
    let globals = "global using App;\n";
    let tests = r"using MoqNs = Moq;
using Subs = NSubstitute.Substitute;
using static FakeItEasy.A;

class T
{
    object A() => new MoqNs.Mock<IService>();
    object B() => Subs.For<IService>();
    object C() => Fake<IService>();
    object D() => new global::Moq.Mock<IService>();
}
";
    let result = check(&[
        ("Service.cs", MARKED_SERVICE),
        ("Globals.cs", globals),
        ("T.cs", tests),
    ]);
    let lines: Vec<usize> = result.diagnostics.iter().map(|d| d.location.line).collect();
    assert_eq!(lines, vec![7, 8, 9, 10]);
}

#[test]
fn file_scoped_namespace_and_nested_types() {
    let contracts = r#"namespace App.Contracts;

using DoNotMock;

public static class Ports
{
    [DoNotMock("Use FakeGateway")]
    public interface IGateway { }
}
"#;
    let tests = r"namespace App.Tests;

using Moq;
using App.Contracts;

class T
{
    object M() => new Mock<Ports.IGateway>();
}
";
    let result = check(&[("Contracts.cs", contracts), ("T.cs", tests)]);
    let diagnostic = only(&result);
    assert!(diagnostic.message.contains("App.Contracts.Ports.IGateway"));
    assert_eq!(diagnostic.location.line, 8);
}

#[test]
fn custom_marker_and_signature() {
    let config = Config::parse(
        r#"
[marker]
name = "NoMockAttribute"
namespace = "Acme.Testing"

[registry]
builtins = false

[[registry.signatures]]
library = "Acme.Fakes"
category = "call"
container = "Fakes"
namespace = "Acme.Testing"
method = "Create"
"#,
    )
    .unwrap();

    let contracts = r#"using Acme.Testing;
namespace App
{
    [NoMock("Use the Acme fake")] public interface IService { }
    [DoNotMock.DoNotMock("ignored")] public interface IOther { }
}
"#;
    let tests = r"using Acme.Testing;
using Moq;
using App;
class T
{
    object A() => Fakes.Create<IService>();
    object B() => Fakes.Create<IOther>();
    object C() => new Mock<IService>();
}
";
    let result = check_with(config, &[("Contracts.cs", contracts), ("T.cs", tests)]);
    let diagnostic = only(&result);
    assert_eq!(diagnostic.location.line, 6);
    assert_eq!(diagnostic.property(MESSAGE_PROPERTY), Some("Use the Acme fake"));
}

#[test]
fn syntax_error_does_not_hide_other_mocks() {
    let tests = r"using Moq;
using App;

class ServiceTests
{
    void Broken() { int x = ; }

    void Run()
    {
        var mock = new Mock<IService>();
    }
}
";
    let result = check(&[("Service.cs", MARKED_SERVICE), ("ServiceTests.cs", tests)]);
    let diagnostic = only(&result);
    assert_eq!(diagnostic.location.line, 10);
    assert_eq!(result.files_checked, 2);
}

#[test]
fn syntax_error_fails_when_configured() {
    let tests = "using Moq;\nusing App;\nclass T { void B() { int x = ; } object M() => new Mock<IService>(); }\n";
    let config = Config::parse("[analyzer]\nfail_on_parse_error = true\n").unwrap();
    let sources = vec![
        SourceFile::new("Service.cs", MARKED_SERVICE),
        SourceFile::new("T.cs", tests),
    ];
    let err = analyzer_with(config).analyze_sources(sources).unwrap_err();
    assert!(matches!(err, donotmock_core::AnalyzerError::Parse { .. }));
}

#[test]
fn fixture_project_end_to_end() {
    let analyzer = Analyzer::builder()
        .root(fixture_root())
        .front_end(CSharpFrontEnd::new())
        .build()
        .unwrap();
    let result = analyzer.analyze().unwrap();

    assert_eq!(result.files_checked, 4, "Broken.cs is analyzed despite its syntax error");
    assert_eq!(result.nodes_evaluated, 3);

    let found: Vec<(String, usize, Option<&str>)> = result
        .diagnostics
        .iter()
        .map(|d| {
            (
                d.location.file.display().to_string().replace('\\', "/"),
                d.location.line,
                d.property(MESSAGE_PROPERTY),
            )
        })
        .collect();
    assert_eq!(
        found,
        vec![
            ("Tests/OrderTests.cs".to_string(), 11, Some("Use FakeClock instead")),
            (
                "Tests/OrderTests.cs".to_string(),
                12,
                Some("Use InMemoryStore from Shop.Testing")
            ),
        ]
    );
}

#[test]
fn repeated_runs_are_identical() {
    let analyzer = Analyzer::builder()
        .root(fixture_root())
        .front_end(CSharpFrontEnd::new())
        .build()
        .unwrap();
    let render = |result: AnalysisResult| {
        result
            .diagnostics
            .iter()
            .map(Diagnostic::format)
            .collect::<Vec<_>>()
    };
    let first = render(analyzer.analyze().unwrap());
    let second = render(analyzer.analyze().unwrap());
    assert_eq!(first, second);
}
