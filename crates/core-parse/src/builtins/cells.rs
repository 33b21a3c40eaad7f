//! Cell allocation built-ins: reserve tape cells, bind the address to an
//! object-like macro, and zero the cells in the emitted program.

use crate::parser::{Parser, is_reserved_keyword};
use crate::table::Macro;
use core_lexer::{Token, TokenKind};

pub(super) fn alloc_cell8(p: &mut Parser, tok: &Token) {
    alloc_cell(p, tok, 1);
}

pub(super) fn alloc_cell16(p: &mut Parser, tok: &Token) {
    alloc_cell(p, tok, 2);
}

fn alloc_cell(p: &mut Parser, tok: &Token, cells: i32) {
    let Some(name) = p.parse_ident_arg(tok) else {
        return;
    };
    if is_reserved_keyword(&name) {
        p.diags.error(
            tok.loc.clone(),
            format!("cannot bind reserved name '{name}'"),
        );
        return;
    }

    let addr = p.output.alloc_cells(cells);
    p.table.define(
        Macro {
            name,
            params: vec![],
            body: vec![Token::make_int(addr, tok.loc.clone())],
            loc: tok.loc.clone(),
        },
        &mut p.diags,
    );

    p.expand_source(&pseudo_name(tok), &zero_cells(addr, cells));
}

pub(super) fn free_cell8(p: &mut Parser, tok: &Token) {
    free_cell(p, tok, 1);
}

pub(super) fn free_cell16(p: &mut Parser, tok: &Token) {
    free_cell(p, tok, 2);
}

fn free_cell(p: &mut Parser, tok: &Token, cells: i32) {
    let Some(name) = p.parse_ident_arg(tok) else {
        return;
    };

    let addr = match p.table.lookup(&name) {
        None => {
            p.diags.error(
                tok.loc.clone(),
                format!("{}: macro '{name}' is not defined", tok.text),
            );
            return;
        }
        Some(mac)
            if !mac.params.is_empty()
                || mac.body.len() != 1
                || mac.body[0].kind != TokenKind::Integer =>
        {
            p.diags.error(
                tok.loc.clone(),
                format!(
                    "{}: '{name}' is not an alloc_cell{} result",
                    tok.text,
                    cells * 8
                ),
            );
            return;
        }
        Some(mac) => mac.body[0].int_value,
    };

    p.output.free_cells(&tok.loc, addr, &mut p.diags);
    p.table.undef(&name);

    p.expand_source(&pseudo_name(tok), &zero_cells(addr, cells));
}

fn pseudo_name(tok: &Token) -> String {
    format!("({})", tok.text)
}

/// `{ >a [-] }` for one cell, extended cell by cell for wider objects.
fn zero_cells(addr: i32, cells: i32) -> String {
    let mut code = String::from("{ ");
    for i in 0..cells {
        code.push_str(&format!(">{} [-] ", addr + i));
    }
    code.push('}');
    code
}
