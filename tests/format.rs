use mips_asm::format::{fmt_listing, Report};
use mips_asm::isa::mips32;
use mips_asm::{assemble, AsmConfig, Assembly, OutputStyle};
use pretty_assertions::assert_eq;

fn program() -> Assembly {
    let isa = mips32::table().unwrap();
    assemble(&isa, "add $t0, $t1, $t2   # sum\nend: j end", AsmConfig::default())
}

#[test]
fn plain_hex() {
    let out = fmt_listing(&program(), &OutputStyle::default());
    assert_eq!(out, "012a4020\n08000001\n");
}

#[test]
fn hex_with_comments() {
    let style = OutputStyle { comments: true, ..OutputStyle::default() };
    let out = fmt_listing(&program(), &style);
    assert_eq!(out, "012a4020\t// add $t0, $t1, $t2\n08000001\t// end: j end\n");
}

#[test]
fn memory_initializer_hex_and_binary() {
    let style = OutputStyle { memory_init: true, ..OutputStyle::default() };
    assert_eq!(
        fmt_listing(&program(), &style),
        "memory[0] = 32'h012a4020;\nmemory[1] = 32'h08000001;\n"
    );

    let style = OutputStyle { memory_init: true, binary: true, comments: true };
    let out = fmt_listing(&program(), &style);
    let first = out.lines().next().unwrap();
    assert_eq!(
        first,
        "memory[0] = 32'b00000001001010100100000000100000;\t// add $t0, $t1, $t2"
    );
}

#[test]
fn report_serializes_words_symbols_and_diagnostics() {
    let isa = mips32::table().unwrap();
    let asm = assemble(&isa, "top: nop\nbeq $0, $0, gone", AsmConfig::default());
    let report = Report::new(&asm, &OutputStyle::default());
    let v = serde_json::to_value(&report).unwrap();
    assert_eq!(v["words"][1]["address"], 4);
    assert_eq!(v["words"][1]["word"], "10000000");
    assert_eq!(v["words"][1]["source"], "beq $0, $0, gone");
    assert_eq!(v["symbols"]["top"], 0);
    assert_eq!(v["diagnostics"][0]["line"], 2);
    assert_eq!(v["diagnostics"][0]["error"]["UnresolvedLabel"]["label"], "gone");
}
