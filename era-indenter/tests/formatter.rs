use era_indenter::{
    format_source, split_lines, Closer, FormatErrorKind, Indenter, IndentUnit, IndenterConfig,
    Line,
};

fn spaces(width: usize) -> IndenterConfig {
    IndenterConfig::default().with_indent_unit(IndentUnit::spaces(width))
}

fn assert_lines(actual: &str, expected: &[&str]) {
    let actual_lines: Vec<&str> = actual.lines().collect();
    assert_eq!(expected, actual_lines.as_slice());
}

#[test]
fn formats_nested_blocks() {
    let input = r#"@SHOP_MAIN
IF FLAG:1
FOR LOCAL, 0, 10
PRINTFORML {LOCAL}
NEXT
ELSEIF FLAG:2
WHILE 1
BREAK
WEND
ELSE
PRINTL none
ENDIF
"#;

    let expected = [
        "@SHOP_MAIN",
        "IF FLAG:1",
        "  FOR LOCAL, 0, 10",
        "    PRINTFORML {LOCAL}",
        "  NEXT",
        "ELSEIF FLAG:2",
        "  WHILE 1",
        "    BREAK",
        "  WEND",
        "ELSE",
        "  PRINTL none",
        "ENDIF",
    ];

    let output = format_source(input, &spaces(2));
    println!("actual_data: {:?}", output.text.lines().collect::<Vec<_>>());
    assert!(output.errors.is_empty(), "unexpected errors: {:?}", output.errors);
    assert_lines(&output.text, &expected);
}

#[test]
fn select_case_body_is_two_levels_deep() {
    let input = r#"SELECTCASE RESULT
CASE 0
PRINTL zero
CASEELSE
PRINTL other
ENDSELECT
DONE = 1
"#;

    let expected = [
        "SELECTCASE RESULT",
        "  CASE 0",
        "    PRINTL zero",
        "  CASEELSE",
        "    PRINTL other",
        "ENDSELECT",
        "DONE = 1",
    ];

    assert_lines(&format_source(input, &spaces(2)).text, &expected);
}

#[test]
fn sif_indents_only_the_next_statement() {
    let input = "IF A\nSIF B\nC = 1\nD = 2\nENDIF\n";
    let expected = ["IF A", "  SIF B", "    C = 1", "  D = 2", "ENDIF"];
    assert_lines(&format_source(input, &spaces(2)).text, &expected);
}

#[test]
fn sif_skips_blank_lines_and_comments() {
    let config = IndenterConfig {
        indent_commented_lines: true,
        ..spaces(2)
    };
    let input = "SIF A\n\n; why\nB = 1\nC = 2\n";
    let expected = ["SIF A", "", "  ; why", "  B = 1", "C = 2"];
    assert_lines(&format_source(input, &config).text, &expected);
}

#[test]
fn sif_followed_by_block_is_rejected_and_left_alone() {
    let input = "SIF A\n   IF B\n  ENDIF\n";
    let output = format_source(input, &spaces(2));

    let kinds: Vec<_> = output.errors.iter().map(|err| (err.line, &err.kind)).collect();
    assert_eq!(
        kinds,
        vec![
            (1, &FormatErrorKind::IllegalSifBody { closer: None }),
            (2, &FormatErrorKind::IllegalSifBody { closer: None }),
        ]
    );
    assert_lines(&output.text, &["SIF A", "   IF B", "  ENDIF"]);
}

#[test]
fn stray_endif_is_reported_without_changing_depth() {
    let input = "  ENDIF\nA = 1\nIF B\nC = 2\nENDIF\n";
    let output = format_source(input, &spaces(2));

    assert_eq!(output.errors.len(), 1);
    assert_eq!(output.errors[0].line, 0);
    assert_eq!(
        output.errors[0].kind,
        FormatErrorKind::StructuralMismatch(Closer::Block)
    );
    assert_lines(&output.text, &["  ENDIF", "A = 1", "IF B", "  C = 2", "ENDIF"]);
}

#[test]
fn continuation_is_one_logical_statement() {
    let input = "X = {\n1\n}\n";
    assert_lines(&format_source(input, &spaces(2)).text, &["X = {", "  1", "}"]);
}

#[test]
fn continuation_later_body_lines_sit_two_levels_deep() {
    let input = "IF A\nLIST = {\n1,\n2,\n\n3\n}\nENDIF\n";
    let expected = [
        "IF A",
        "  LIST = {",
        "    1,",
        "      2,",
        "      ",
        "      3",
        "  }",
        "ENDIF",
    ];
    assert_lines(&format_source(input, &spaces(2)).text, &expected);
}

#[test]
fn continuation_body_keywords_are_not_reinterpreted() {
    let input = "{\nIF A == 1 &&\nENDIF_FLAG\n}\nB = 1\nENDIF\n";
    let output = format_source(input, &spaces(2));
    assert!(output.errors.is_empty(), "unexpected errors: {:?}", output.errors);
    let expected = ["{", "  IF A == 1 &&", "    ENDIF_FLAG", "}", "  B = 1", "ENDIF"];
    assert_lines(&output.text, &expected);
}

#[test]
fn empty_continuation_inside_sif_keeps_the_sif_pending() {
    let input = "SIF A\nX = {\n}\nB = 1\nC = 1\n";
    let expected = ["SIF A", "  X = {", "  }", "  B = 1", "C = 1"];
    assert_lines(&format_source(input, &spaces(2)).text, &expected);
}

#[test]
fn nested_continuation_is_reported() {
    let input = "X = {\nY = {\n1\n}\n";
    let output = format_source(input, &spaces(2));
    assert_eq!(output.errors.len(), 1);
    assert_eq!(output.errors[0].line, 1);
    assert_eq!(output.errors[0].kind, FormatErrorKind::NestedConstruct);
    assert_lines(&output.text, &["X = {", "Y = {", "  1", "}"]);
}

#[test]
fn continuation_entered_from_sif_keeps_the_extra_level() {
    let input = "SIF A\nX = {\n1,\n2\n}\nB\n";
    let output = format_source(input, &spaces(2));
    assert!(output.errors.is_empty(), "unexpected errors: {:?}", output.errors);
    let expected = ["SIF A", "  X = {", "    1,", "      2", "  }", "B"];
    assert_lines(&output.text, &expected);
}

#[test]
fn rejected_continuation_close_resumes_normal_indentation() {
    let input = "{\nENDIF\n}\nIF A\nB = 1\nENDIF\nC = 2\n";
    let output = format_source(input, &spaces(2));
    let lines: Vec<_> = output.errors.iter().map(|err| err.line).collect();
    assert_eq!(lines, vec![2]);
    assert_eq!(
        output.errors[0].kind,
        FormatErrorKind::StructuralMismatch(Closer::Block)
    );
    let expected = ["{", "ENDIF", "}", "IF A", "  B = 1", "ENDIF", "C = 2"];
    assert_lines(&output.text, &expected);
}

#[test]
fn commented_out_opener_is_a_comment() {
    let input = "; old X = {\nIF A\nB = 1\nENDIF\nC = 2\n";
    let output = format_source(input, &spaces(2));
    assert!(output.errors.is_empty(), "unexpected errors: {:?}", output.errors);
    let expected = ["; old X = {", "IF A", "  B = 1", "ENDIF", "C = 2"];
    assert_lines(&output.text, &expected);
}

#[test]
fn skip_block_contents_are_preserved() {
    let input = "IF A\n  [SKIPSTART]\n      ENDIF\n junk\n    [SKIPEND]\nB = 1\nENDIF\n";
    let expected = [
        "IF A",
        "[SKIPSTART]",
        "      ENDIF",
        " junk",
        "[SKIPEND]",
        "  B = 1",
        "ENDIF",
    ];
    assert_lines(&format_source(input, &spaces(2)).text, &expected);
}

#[test]
fn skip_block_under_sif_hands_the_sif_to_the_next_statement() {
    let input = "IF A\nSIF B\n[SKIPSTART]\n    raw text\n[SKIPEND]\nC = 1\nD = 1\nENDIF\n";
    let output = format_source(input, &spaces(2));
    assert!(output.errors.is_empty(), "unexpected errors: {:?}", output.errors);
    let expected = [
        "IF A",
        "  SIF B",
        "[SKIPSTART]",
        "    raw text",
        "[SKIPEND]",
        "    C = 1",
        "  D = 1",
        "ENDIF",
    ];
    assert_lines(&output.text, &expected);
}

#[test]
fn unmatched_markers_are_reported() {
    let output = format_source("[SKIPEND]\n}\n", &spaces(2));
    let kinds: Vec<_> = output.errors.iter().map(|err| err.kind.clone()).collect();
    assert_eq!(
        kinds,
        vec![
            FormatErrorKind::StructuralMismatch(Closer::SkipBlock),
            FormatErrorKind::StructuralMismatch(Closer::Continuation),
        ]
    );
}

#[test]
fn comments_are_untouched_by_default() {
    let input = "IF A\n      ; note\nB\nENDIF\n";
    let expected = ["IF A", "      ; note", "  B", "ENDIF"];
    assert_lines(&format_source(input, &spaces(2)).text, &expected);
}

#[test]
fn function_declarations_reset_depth() {
    let input = "@FIRST\nIF A\nB\n@SECOND\nC\n";
    let expected = ["@FIRST", "IF A", "  B", "@SECOND", "C"];
    assert_lines(&format_source(input, &spaces(2)).text, &expected);

    let config = IndenterConfig {
        indent_inside_function_body: true,
        ..spaces(2)
    };
    let expected = ["  @FIRST", "  IF A", "    B", "  @SECOND", "  C"];
    assert_lines(&format_source(input, &config).text, &expected);
}

#[test]
fn tabs_use_one_character_per_level() {
    let input = "IF A\nIF B\nC\nENDIF\nENDIF\n";
    let output = format_source(input, &IndenterConfig::default().with_indent_unit(IndentUnit::tabs()));
    assert_lines(&output.text, &["IF A", "\tIF B", "\t\tC", "\tENDIF", "ENDIF"]);
}

#[test]
fn blank_lines_never_keep_indentation() {
    let input = "IF A\n      \nB\nENDIF\n";
    assert_lines(&format_source(input, &spaces(2)).text, &["IF A", "", "  B", "ENDIF"]);
}

#[test]
fn interactive_newline_after_continuation_opener() {
    let config = spaces(2);
    let mut indenter = Indenter::new(config);
    let document = split_lines("IF A\n    X = {\n");

    for line in &document {
        indenter.update(line).expect("line is valid");
    }
    // The host replays the freshly inserted, still empty line first.
    indenter.update(&Line::new(2, "")).expect("blank line is valid");

    let prediction = indenter.next_line().expect("prediction after opener");
    assert_eq!(prediction.indent, "    ");
    let opening = prediction.opening_line.expect("opener is fixed up");
    assert_eq!(opening.line, 1);
    assert_eq!(opening.text, "  X = {");
}

#[test]
fn interactive_newline_after_block_open() {
    let mut indenter = Indenter::new(spaces(4));
    indenter.update(&Line::new(0, "IF A")).expect("valid");
    indenter.update(&Line::new(1, "")).expect("valid");
    let prediction = indenter.next_line().expect("prediction");
    assert_eq!(prediction.indent, "    ");
    assert_eq!(prediction.opening_line, None);
}
