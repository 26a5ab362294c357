//! Properties of the normalizer over scripts built from common lines.

use proptest::prelude::*;

use tablekit_script::normalizer::normalize;

const LINES: [&str; 18] = [
    "total = price * qty",
    "doc.total = total",
    "console.log('total', total)",
    "return total",
    "if (total > 10) {",
    "} else {",
    "}",
    "const x = getFieldValue('a')",
    "setFieldValue('b', x) // keep",
    "items.forEach(i => {",
    "})",
    "const y = list",
    "  .map(v => v / 2)",
    "/* note */",
    "",
    "const s = `a ${b}`",
    "const data = {",
    "  total: await x",
];

fn script() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(LINES.to_vec()), 0..24)
        .prop_map(|lines| lines.join("\n"))
}

const MEMBERS: [&str; 4] = [
    "  total: await x",
    "  first: getFieldValue('a')",
    "  logged: console.log(total)",
    "  nested: { v: await y }",
];

/// `const data = { ... }` with one member per line.
fn object_literal() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(MEMBERS.to_vec()), 1..8)
        .prop_map(|members| format!("const data = {{\n{}\n}}", members.join(",\n")))
}

proptest! {
    #[test]
    fn prop_idempotent(code in script()) {
        let once = normalize(&code);
        prop_assert_eq!(normalize(&once), once);
    }

    #[test]
    fn prop_line_count_preserved(code in script()) {
        let out = normalize(&code);
        prop_assert_eq!(out.lines().count(), code.lines().count());
    }

    #[test]
    fn prop_object_literal_unchanged(code in object_literal()) {
        prop_assert_eq!(normalize(&code), code);
    }

    #[test]
    fn prop_only_terminators_added(code in script()) {
        let out = normalize(&code);
        prop_assert_eq!(out.replace(';', ""), code.replace(';', ""));
    }
}
