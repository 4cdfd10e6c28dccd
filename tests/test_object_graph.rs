//! Integration tests for the indirect-object graph.
//!
//! Covers:
//! - Object identity in the cross-reference table
//! - Direct vs indirect storage in containers
//! - Typed views over generic dictionaries
//! - Compaction and renumbering

use pdf_graph::config::{DocumentOptions, OpenMode};
use pdf_graph::{
    ArrayKind, CreateOptions, DictionaryKind, DocumentLoader, Error, ObjectId, PdfArray,
    PdfDictionary, PdfDocument, PdfItem, PdfPage, PdfRectangle, PdfReference,
};
use proptest::prelude::*;
use std::collections::HashSet;

fn catalog_add(doc: &PdfDocument, key: &str, reference: &PdfReference) {
    doc.catalog()
        .unwrap()
        .dictionary_mut()
        .unwrap()
        .elements_mut()
        .set_reference(key, reference)
        .unwrap();
}

proptest! {
    #[test]
    fn prop_added_objects_get_unique_ids(kinds in proptest::collection::vec(any::<bool>(), 1..40)) {
        let doc = PdfDocument::new();
        let mut seen = HashSet::new();
        for is_dictionary in kinds {
            let reference = if is_dictionary {
                doc.add_object(PdfDictionary::new()).unwrap()
            } else {
                doc.add_object(PdfArray::new()).unwrap()
            };
            prop_assert!(seen.insert(reference.object_id()));

            let first = doc.object(reference.object_id()).unwrap();
            let second = doc.object(reference.object_id()).unwrap();
            prop_assert!(PdfReference::ptr_eq(&first, &second));
            prop_assert!(PdfReference::ptr_eq(&first, &reference));
        }
    }

    #[test]
    fn prop_compaction_keeps_exactly_the_reachable_objects(linked in proptest::collection::vec(any::<bool>(), 1..30)) {
        let doc = PdfDocument::new();
        let mut expected = doc.object_count();
        for (i, link) in linked.iter().enumerate() {
            let reference = doc.add_object(PdfDictionary::new()).unwrap();
            if *link {
                catalog_add(&doc, &format!("/Obj{}", i), &reference);
                expected += 1;
            }
        }
        let garbage = doc.object_count() - expected;
        prop_assert_eq!(doc.compact().unwrap(), garbage);
        prop_assert_eq!(doc.object_count(), expected);

        doc.renumber().unwrap();
        let mut numbers: Vec<u32> = doc.all_references().iter().map(|r| r.object_id().number).collect();
        numbers.sort_unstable();
        prop_assert_eq!(numbers, (1..=expected as u32).collect::<Vec<_>>());
    }

    #[test]
    fn prop_integer_round_trip(value in any::<i64>()) {
        let mut dict = PdfDictionary::new();
        dict.elements_mut().set_integer("/Value", value);
        prop_assert_eq!(dict.elements().get_integer("/Value").unwrap(), value);
        prop_assert_eq!(dict.elements().get_real("/Value").unwrap(), value as f64);
    }
}

#[test]
fn test_clone_is_independent() {
    let mut dict = PdfDictionary::new();
    dict.elements_mut().set_integer("/A", 1);
    dict.elements_mut().set_name("/N", "X");
    dict.elements_mut().set_string("/S", "text");

    let mut copy = dict.clone();
    assert_eq!(copy.elements(), dict.elements());

    copy.elements_mut().set_integer("/A", 2);
    copy.elements_mut().remove("/N");
    assert_eq!(dict.elements().get_integer("/A").unwrap(), 1);
    assert_eq!(dict.elements().get_name("/N").unwrap(), "/X");
    assert_ne!(copy.elements(), dict.elements());
}

#[test]
fn test_transform_keeps_identity() {
    let doc = PdfDocument::new();
    let reference = doc.add_object(PdfDictionary::new()).unwrap();
    let id = reference.object_id();

    let first = PdfPage::from_reference(reference.clone()).unwrap();
    let second = PdfPage::from_reference(reference.clone()).unwrap();
    assert!(PdfReference::ptr_eq(first.reference(), second.reference()));
    assert_eq!(first.object_id(), id);
    assert_eq!(reference.dictionary().unwrap().kind(), DictionaryKind::Page);
    assert_eq!(reference.dictionary().unwrap().object_id(), id);
}

#[test]
fn test_get_value_upgrades_in_slot() {
    let loader = DocumentLoader::new(DocumentOptions::default());
    let mut pages = PdfDictionary::new();
    pages.elements_mut().set_value("/Kids", PdfArray::new()).unwrap();
    pages.elements_mut().set_integer("/Count", 0);
    let pages = loader.define(ObjectId::new(2, 0), None, pages.into()).unwrap();

    let mut catalog = PdfDictionary::new();
    catalog.elements_mut().set_reference("/Pages", &pages).unwrap();
    let catalog = loader.define(ObjectId::new(1, 0), None, catalog.into()).unwrap();

    let mut trailer = PdfDictionary::new();
    trailer.elements_mut().set_reference("/Root", &catalog).unwrap();
    let doc = loader.finish(trailer).unwrap();

    assert_eq!(pages.dictionary().unwrap().kind(), DictionaryKind::Pages);
    {
        let mut tree = pages.dictionary_mut().unwrap();
        let kids = tree.elements_mut().get_value("/Kids", CreateOptions::None).unwrap().unwrap();
        assert_eq!(kids.as_array().unwrap().kind(), ArrayKind::Kids);
    }
    assert!(PdfReference::ptr_eq(&doc.catalog().unwrap(), &catalog));
}

#[test]
fn test_indirect_values_are_stored_as_references() {
    let doc = PdfDocument::new();
    let target = doc.add_object(PdfDictionary::new()).unwrap();
    let holder = doc.add_object(PdfDictionary::new()).unwrap();

    {
        let mut dict = holder.dictionary_mut().unwrap();
        dict.elements_mut().set_value("/Target", PdfItem::Reference(target.clone())).unwrap();
        match dict.elements().get("/Target") {
            Some(PdfItem::Reference(r)) => assert!(PdfReference::ptr_eq(r, &target)),
            other => panic!("Expected a reference, got {:?}", other),
        }
        assert!(matches!(
            dict.elements_mut().set_object("/Other", PdfItem::Reference(target.clone())),
            Err(Error::InvalidOperation(_))
        ));
    }

    let mut array = PdfArray::new();
    array.elements_mut().add(PdfItem::Reference(target.clone())).unwrap();
    assert_eq!(array.elements().get_reference(0), Some(target));
}

#[test]
fn test_get_integer_default_and_create() {
    let mut dict = PdfDictionary::new();
    assert_eq!(dict.elements().get_integer("/Count").unwrap(), 0);
    assert!(!dict.elements().contains_key("/Count"));

    assert_eq!(dict.elements_mut().get_integer_or_create("/Count").unwrap(), 0);
    assert!(dict.elements().contains_key("/Count"));
    assert_eq!(dict.elements().get_integer("/Count").unwrap(), 0);
}

#[test]
fn test_rectangle_round_trip() {
    let mut dict = PdfDictionary::new();
    dict.elements_mut()
        .set_rectangle("/MediaBox", PdfRectangle::new(0.0, 0.0, 595.0, 842.0));
    let rect = dict.elements().get_rectangle("/MediaBox").unwrap();
    assert_eq!(rect.width(), 595.0);
    assert_eq!(rect.height(), 842.0);
}

#[test]
fn test_compaction_removes_object_seven() {
    let doc = PdfDocument::new();
    let mut linked = Vec::new();
    for i in 0..4 {
        let reference = doc.add_object(PdfDictionary::new()).unwrap();
        catalog_add(&doc, &format!("/Linked{}", i), &reference);
        linked.push(reference);
    }
    let orphan = doc.add_object(PdfDictionary::new()).unwrap();
    assert_eq!(orphan.object_id(), ObjectId::new(7, 0));
    let before = doc.object_count();

    assert_eq!(doc.compact().unwrap(), 1);
    assert_eq!(doc.object_count(), before - 1);
    assert!(!doc.contains_object(ObjectId::new(7, 0)));
    for reference in &linked {
        assert!(doc.contains_object(reference.object_id()));
    }

    let ids: Vec<ObjectId> = doc.xref().unwrap().object_ids();
    assert_eq!(doc.compact().unwrap(), 0);
    assert_eq!(doc.xref().unwrap().object_ids(), ids);
}

#[test]
fn test_read_only_document() {
    let doc = PdfDocument::with_options(DocumentOptions::default().with_open_mode(OpenMode::ReadOnly));
    assert!(doc.pages().add_new_page().is_err());
    assert!(doc.save_to_vec().is_err());
    assert_eq!(doc.pages().count().unwrap(), 0);
}

#[test]
fn test_error_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Error>();
}
