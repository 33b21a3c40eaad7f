//! Output built-ins. Single characters go through a scratch cell; decimal
//! printing extracts digits low-to-high into a small buffer, then walks the
//! buffer backwards (buffer-and-reverse) so the digits come out in reading
//! order. Signed printing prints the minus sign and defers to the unsigned
//! form on the magnitude.

use crate::parser::Parser;
use core_lexer::Token;

pub(super) fn print_char(p: &mut Parser, tok: &Token) {
    let Some(vals) = p.parse_expr_args(tok, 1) else {
        return;
    };
    let ch = vals[0];
    let t = p.make_temp_name("t_char");
    p.expand_source(
        "(print_char)",
        &format!(
            "{{ alloc_cell8({t}) \
               set8({t}, {ch}) \
               >{t} . \
               free_cell8({t}) \
             }}"
        ),
    );
}

pub(super) fn print_char8(p: &mut Parser, tok: &Token) {
    let Some(vals) = p.parse_expr_args(tok, 1) else {
        return;
    };
    let cell = vals[0];
    p.expand_source("(print_char8)", &format!("{{ >{cell} . }}"));
}

pub(super) fn print_string(p: &mut Parser, tok: &Token) {
    let Some(text) = p.parse_string_arg(tok) else {
        return;
    };
    let mut code = String::from("{ ");
    for byte in text.bytes() {
        code.push_str(&format!("print_char({byte}) "));
    }
    code.push('}');
    p.expand_source("(print_string)", &code);
}

pub(super) fn print_newline(p: &mut Parser, tok: &Token) {
    let _ = tok;
    p.advance(); // consume the name; no argument list
    p.expand_source("(print_newline)", "print_char(10)");
}

pub(super) fn print_cell8(p: &mut Parser, tok: &Token) {
    print_cell_unsigned(p, tok, 8);
}

pub(super) fn print_cell16(p: &mut Parser, tok: &Token) {
    print_cell_unsigned(p, tok, 16);
}

pub(super) fn print_cell8s(p: &mut Parser, tok: &Token) {
    print_cell_signed(p, tok, 8);
}

pub(super) fn print_cell16s(p: &mut Parser, tok: &Token) {
    print_cell_signed(p, tok, 16);
}

/// Unsigned decimal print with a trailing space. Digits are peeled off with
/// `mod 10` / `div 10` into an indexed buffer (index dispatch is a chain of
/// equality tests, since cells cannot be addressed indirectly), then printed
/// back-to-front.
fn print_cell_unsigned(p: &mut Parser, tok: &Token, width: u32) {
    let max_digits = if width == 8 { 3 } else { 5 };
    let x = width;

    let Some(vals) = p.parse_expr_args(tok, 1) else {
        return;
    };
    let a = vals[0];

    let t_a = p.make_temp_name("t_val");
    let t_digit = p.make_temp_name("t_digit");
    let t_cond = p.make_temp_name("t_cond");
    let t_ten = p.make_temp_name("t_ten");
    let t_zero_char = p.make_temp_name("t_zero_char");
    let t_idx = p.make_temp_name("t_idx");
    let t_numbers: Vec<String> = (0..max_digits)
        .map(|i| p.make_temp_name(&format!("number_{i}")))
        .collect();
    let t_buffer: Vec<String> = (0..max_digits)
        .map(|i| p.make_temp_name(&format!("buffer_{i}")))
        .collect();

    let mut code = format!(
        "{{ alloc_cell{x}({t_a}) \
           alloc_cell{x}({t_digit}) \
           alloc_cell{x}({t_cond}) \
           alloc_cell{x}({t_ten}) \
           set{x}({t_ten}, 10) \
           alloc_cell{x}({t_zero_char}) \
           set{x}({t_zero_char}, '0') "
    );

    for (i, number) in t_numbers.iter().enumerate() {
        code.push_str(&format!(
            "alloc_cell{x}({number}) set{x}({number}, {i}) "
        ));
    }
    code.push_str(&format!("alloc_cell8({t_idx}) "));
    for cell in &t_buffer {
        code.push_str(&format!("alloc_cell8({cell}) "));
    }

    code.push_str(&format!("copy{x}({a}, {t_a}) "));

    // extract digits; the loop runs at least once so 0 prints as "0"
    code.push_str(&format!(
        "set{x}({t_cond}, 1) \
         while({t_cond}) \
           copy{x}({t_a}, {t_digit}) \
           mod{x}({t_digit}, {t_ten}) \
           add{x}({t_digit}, {t_zero_char}) "
    ));
    for (i, cell) in t_buffer.iter().enumerate() {
        code.push_str(&format!(
            "copy8({t_idx}, {t_cond}) \
             eq8({t_cond}, {number}) \
             if({t_cond}) \
               copy8({t_digit}, {cell}) \
             endif ",
            number = t_numbers[i]
        ));
    }
    code.push_str(&format!(
        "add8({t_idx}, {one}) \
         div{x}({t_a}, {t_ten}) \
         copy{x}({t_a}, {t_cond}) \
         ne{x}({t_cond}, {zero}) \
         endwhile ",
        one = t_numbers[1],
        zero = t_numbers[0]
    ));

    // print the buffered digits highest-first
    code.push_str(&format!(
        "sub8({t_idx}, {one}) \
         set8({t_cond}, 1) \
         while({t_cond}) ",
        one = t_numbers[1]
    ));
    for (i, cell) in t_buffer.iter().enumerate() {
        code.push_str(&format!(
            "copy8({t_idx}, {t_cond}) \
             eq8({t_cond}, {number}) \
             if({t_cond}) \
               print_char8({cell}) \
             endif ",
            number = t_numbers[i]
        ));
    }
    code.push_str(&format!(
        "copy8({t_idx}, {t_cond}) \
         ne8({t_cond}, {zero}) \
         sub8({t_idx}, {one}) \
         endwhile \
         print_char(' ') ",
        zero = t_numbers[0],
        one = t_numbers[1]
    ));

    code.push_str(&format!(
        "free_cell{x}({t_a}) \
         free_cell{x}({t_digit}) \
         free_cell{x}({t_cond}) \
         free_cell{x}({t_ten}) \
         free_cell{x}({t_zero_char}) "
    ));
    for number in &t_numbers {
        code.push_str(&format!("free_cell{x}({number}) "));
    }
    code.push_str(&format!("free_cell8({t_idx}) "));
    for cell in &t_buffer {
        code.push_str(&format!("free_cell8({cell}) "));
    }
    code.push_str("} ");

    p.expand_source(&format!("(print_cell{x})"), &code);
}

/// Signed decimal print: emit `-` for negative values, then print the
/// absolute value through the unsigned form.
fn print_cell_signed(p: &mut Parser, tok: &Token, width: u32) {
    let x = width;
    let Some(vals) = p.parse_expr_args(tok, 1) else {
        return;
    };
    let a = vals[0];

    let t_a = p.make_temp_name("t_val");
    let t_sign = p.make_temp_name("t_sign");
    p.expand_source(
        &format!("(print_cell{x}s)"),
        &format!(
            "{{ alloc_cell{x}({t_a}) \
               alloc_cell{x}({t_sign}) \
               copy{x}({a}, {t_a}) \
               copy{x}({a}, {t_sign}) \
               sign{x}({t_sign}) \
               if({t_sign}) \
                 print_char('-') \
                 abs{x}({t_a}) \
               endif \
               print_cell{x}({t_a}) \
               free_cell{x}({t_a}) \
               free_cell{x}({t_sign}) \
             }} "
        ),
    );
}
