// src/services/spreadsheet.rs

//! Leitor de planilhas de importação.
//!
//! Aceita Excel (`.xlsx`/`.xls`, primeira aba) e CSV separado por `;` (ou `,`
//! quando o cabeçalho não tem `;`), em UTF-8 ou Latin-1. O formato é decidido
//! pelo conteúdo, não pela extensão. Célula ausente vira texto vazio, nunca nulo.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use csv::{ReaderBuilder, Trim};

use crate::common::error::AppError;

// Assinaturas: zip (.xlsx) e OLE2 (.xls)
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Spreadsheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Spreadsheet {
    /// Célula por posição; fora da linha devolve "".
    pub fn cell(row: &[String], index: usize) -> &str {
        row.get(index).map(String::as_str).unwrap_or("")
    }
}

pub fn parse(file_name: &str, bytes: &[u8]) -> Result<Spreadsheet, AppError> {
    let sheet = if is_excel(bytes) { parse_excel(bytes)? } else { parse_csv(bytes)? };

    tracing::debug!("📄 Planilha '{}' lida: {} linhas", file_name, sheet.rows.len());
    Ok(sheet)
}

fn is_excel(bytes: &[u8]) -> bool {
    bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(OLE_MAGIC)
}

fn parse_excel(bytes: &[u8]) -> Result<Spreadsheet, AppError> {
    let invalid = |e: calamine::Error| AppError::InvalidSpreadsheet(e.to_string());

    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec())).map_err(invalid)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::InvalidSpreadsheet("a planilha não tem abas.".into()))?
        .map_err(invalid)?;

    // O range começa na primeira célula usada; colunas vazias à esquerda
    // continuam contando para as posições.
    let left_pad = range.start().map(|(_, col)| col as usize).unwrap_or(0);
    let mut lines = range.rows().map(|row| {
        std::iter::repeat_n(String::new(), left_pad)
            .chain(row.iter().map(cell_text))
            .collect::<Vec<String>>()
    });

    let headers = lines.next().unwrap_or_default();
    let rows = lines.collect();
    Ok(Spreadsheet { headers, rows })
}

// Números inteiros saem sem ".0" (telefones e CNPJs digitados como número)
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e18 => format!("{:.0}", f),
        other => other.to_string().trim().to_string(),
    }
}

fn parse_csv(bytes: &[u8]) -> Result<Spreadsheet, AppError> {
    let content = decode(bytes);
    let content = content.strip_prefix('\u{feff}').unwrap_or(&content);

    let mut reader = ReaderBuilder::new()
        .delimiter(sniff_delimiter(content))
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| AppError::InvalidSpreadsheet(e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| AppError::InvalidSpreadsheet(e.to_string()))?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(Spreadsheet { headers, rows })
}

// UTF-8 primeiro; se falhar, Latin-1 (cada byte é um code point)
fn decode(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

fn sniff_delimiter(content: &str) -> u8 {
    let header = content.lines().next().unwrap_or("");
    if !header.contains(';') && header.contains(',') { b',' } else { b';' }
}

#[cfg(test)]
mod tests {
    use rust_xlsxwriter::Workbook;

    use super::*;

    #[test]
    fn reads_semicolon_csv_with_short_rows() {
        let sheet = parse(
            "clientes.csv",
            b"Tipo;CNPJ;Consultor;Representante;Cliente;Telefone\nA;12.345.678/0001-99;Ana;Joao;Padaria;(54) 3333-4444\nB;;;;Mercado\n",
        )
        .unwrap();

        assert_eq!(sheet.headers.len(), 6);
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(Spreadsheet::cell(&sheet.rows[0], 1), "12.345.678/0001-99");
        assert_eq!(Spreadsheet::cell(&sheet.rows[1], 4), "Mercado");
        assert_eq!(Spreadsheet::cell(&sheet.rows[1], 5), "");
    }

    #[test]
    fn falls_back_to_latin1_and_strips_bom() {
        let mut bytes = b"Tipo;CNPJ;Consultor;Representante;Cliente;Telefone\nA;1;C;R;".to_vec();
        bytes.extend_from_slice(&[0x41, 0xC7, 0xC3, 0x4F]); // "AÇÃO" em Latin-1
        bytes.extend_from_slice(b";1\n");
        let sheet = parse("x.csv", &bytes).unwrap();
        assert_eq!(Spreadsheet::cell(&sheet.rows[0], 4), "AÇÃO");

        let sheet = parse("x.csv", "\u{feff}Tipo;CNPJ\nA;1\n".as_bytes()).unwrap();
        assert_eq!(sheet.headers[0], "Tipo");
    }

    #[test]
    fn comma_separated_files_are_detected() {
        let sheet = parse("x.csv", b"Tipo,CNPJ,Consultor,Rep,Cliente,Fone\nA,1,C,R,Loja,99\n").unwrap();
        assert_eq!(Spreadsheet::cell(&sheet.rows[0], 4), "Loja");
    }

    #[test]
    fn reads_first_sheet_of_an_xlsx_workbook() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, header) in ["Tipo", "CNPJ Empresa", "Consultor", "Representante", "Cliente", "Telefone"]
            .into_iter()
            .enumerate()
        {
            sheet.write_string(0, col as u16, header).unwrap();
        }
        sheet.write_string(1, 1, "12.345.678/0001-99").unwrap();
        sheet.write_string(1, 4, " Padaria Central ").unwrap();
        sheet.write_number(1, 5, 5433334444.0).unwrap();
        sheet.write_string(2, 4, "Mercado Sul").unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let parsed = parse("clientes.xlsx", &bytes).unwrap();
        assert_eq!(parsed.headers[1], "CNPJ Empresa");
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(Spreadsheet::cell(&parsed.rows[0], 0), "");
        assert_eq!(Spreadsheet::cell(&parsed.rows[0], 1), "12.345.678/0001-99");
        assert_eq!(Spreadsheet::cell(&parsed.rows[0], 4), "Padaria Central");
        assert_eq!(Spreadsheet::cell(&parsed.rows[0], 5), "5433334444");
        assert_eq!(Spreadsheet::cell(&parsed.rows[1], 4), "Mercado Sul");
        assert_eq!(Spreadsheet::cell(&parsed.rows[1], 5), "");
    }

    #[test]
    fn format_follows_content_not_extension() {
        // CSV salvo com extensão de Excel continua sendo CSV
        let sheet = parse("clientes.xlsx", b"Tipo;CNPJ\nA;1\n").unwrap();
        assert_eq!(Spreadsheet::cell(&sheet.rows[0], 1), "1");

        // Zip corrompido não é planilha
        let err = parse("sem_extensao", b"PK\x03\x04 corrompido").unwrap_err();
        assert!(matches!(err, AppError::InvalidSpreadsheet(_)));
    }
}
