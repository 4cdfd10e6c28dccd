//! Integration tests for saving documents.

use pdf_graph::config::{FilterOptions, WriterOptions};
use pdf_graph::filters::{decode_stream, encode_stream, ASCII_HEX_DECODE, FLATE_DECODE, LZW_DECODE};
use pdf_graph::writer::PdfWriter;
use pdf_graph::{ObjectId, PdfDictionary, PdfDocument, PdfItem, SecurityHandler};

fn text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Object numbers of all `N G obj` headers, in file order.
fn object_numbers(out: &str) -> Vec<u32> {
    out.lines()
        .filter(|line| line.ends_with(" obj"))
        .filter_map(|line| line.split(' ').next()?.parse().ok())
        .collect()
}

#[test]
fn test_saved_document_shape() {
    let doc = PdfDocument::new();
    for _ in 0..3 {
        doc.pages().add_new_page().unwrap();
    }
    doc.info().unwrap().set_title("Shape").unwrap();
    doc.add_object(PdfItem::Integer(7)).unwrap();

    let out = text(&doc.save_to_vec().unwrap());
    let numbers = object_numbers(&out);
    let expected: Vec<u32> = (1..=numbers.len() as u32).collect();
    assert_eq!(numbers, expected);
    assert_eq!(numbers.len(), doc.object_count());

    assert!(out.contains(&format!("/Size {}", numbers.len() + 1)));
    assert!(out.contains(&format!("xref\n0 {}\n", numbers.len() + 1)));
    assert!(out.contains("/Title (Shape)"));
    assert!(out.contains("/Count 3"));
    assert!(out.contains("/MediaBox [ 0 0 595 842 ]"));
    assert_eq!(out.matches(" n \n").count(), numbers.len());
}

#[test]
fn test_save_twice_is_stable() {
    let doc = PdfDocument::new();
    doc.pages().add_new_page().unwrap();
    let first = doc.save_to_vec().unwrap();
    let second = doc.save_to_vec().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_save_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.pdf");

    let doc = PdfDocument::new();
    doc.pages().add_new_page().unwrap();
    doc.save(&path).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"%PDF-1.7\n"));
    assert!(bytes.ends_with(b"%%EOF\n"));
    assert_eq!(bytes, doc.save_to_vec().unwrap());
}

#[test]
fn test_compressed_stream_decodes_back() {
    let doc = PdfDocument::new();
    let page = doc.pages().add_new_page().unwrap();
    let content = "0 0 m 100 100 l S\n".repeat(40);
    let stream = page.add_content(content.clone().into_bytes()).unwrap();

    let options = WriterOptions::default().with_compress_streams(true);
    let out = doc.save_to_vec_with_options(options).unwrap();
    assert!(text(&out).contains("/Filter /FlateDecode"));

    stream.dictionary_mut().unwrap().try_compress_stream().unwrap();
    let decoded = stream
        .dictionary()
        .unwrap()
        .unfiltered_stream(&FilterOptions::default())
        .unwrap();
    assert_eq!(decoded, content.as_bytes());
}

#[test]
fn test_filter_chain() {
    let data = b"stream data stream data stream data".to_vec();
    let lzw = encode_stream(&data, LZW_DECODE).unwrap();
    let hex = encode_stream(&lzw, ASCII_HEX_DECODE).unwrap();
    let filters = vec![ASCII_HEX_DECODE.to_string(), LZW_DECODE.to_string()];
    assert_eq!(decode_stream(&hex, &filters, &FilterOptions::default()).unwrap(), data);

    let mut dict = PdfDictionary::new();
    dict.set_raw_stream(encode_stream(&data, FLATE_DECODE).unwrap());
    dict.elements_mut().set_name("/Filter", FLATE_DECODE);
    assert_eq!(dict.unfiltered_stream(&FilterOptions::unlimited()).unwrap(), data);
}

/// Reverses string and stream bytes.
struct Reverse;

impl SecurityHandler for Reverse {
    fn encrypt_string(&self, _id: ObjectId, data: &[u8]) -> Vec<u8> {
        data.iter().rev().copied().collect()
    }

    fn encrypt_stream(&self, _id: ObjectId, data: &[u8]) -> Vec<u8> {
        data.iter().rev().copied().collect()
    }
}

#[test]
fn test_security_handler_skips_encrypt_dictionary() {
    let doc = PdfDocument::new();
    doc.info().unwrap().set_title("abc").unwrap();
    let page = doc.pages().add_new_page().unwrap();
    page.add_content(&b"123"[..]).unwrap();

    let mut encrypt = PdfDictionary::new();
    encrypt.elements_mut().set_name("/Filter", "Standard");
    encrypt.elements_mut().set_string("/O", "owner");
    let encrypt = doc.add_object(encrypt).unwrap();
    doc.trailer_mut()
        .unwrap()
        .elements_mut()
        .set_reference("/Encrypt", &encrypt)
        .unwrap();

    let writer = PdfWriter::new(WriterOptions::default()).with_security(Box::new(Reverse));
    let out = text(&writer.write(&doc).unwrap());
    assert!(out.contains("/Title (cba)"));
    assert!(out.contains("stream\n321\nendstream"));
    assert!(out.contains("/O (owner)"));
    assert!(out.contains(&format!("/Encrypt {} 0 R", encrypt.object_id().number)));
}
