use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::{
    catalog::Schema,
    storage::{
        consts::{PAGE_HEADER_SIZE, PAGE_SIZE},
        Rid, Tuple,
    },
    Error, Result,
};

/// A fixed-size page of fixed-length tuples.
///
/// On disk a page is `i32 num_slots` and `i32 used_count` (little-endian)
/// followed by `used_count` packed tuples and zero padding to `PAGE_SIZE`.
/// The on-disk image is compact; slot holes exist only in memory between a
/// delete and the next write-back, so tuples are renumbered into slots
/// `0..used_count` when a page is loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct HeapPage {
    schema: Schema,
    page_no: usize,
    slots: Vec<Option<Tuple>>,
    num_slots: usize,
    num_used: usize,
    free_slots: Vec<usize>,
    dirty: bool,
}

impl HeapPage {
    /// How many tuples of the given schema fit on one page.
    pub fn num_slots_for(schema: &Schema) -> usize {
        (PAGE_SIZE - PAGE_HEADER_SIZE) / schema.tuple_size()
    }

    /// Construct an empty page. The schema must fit at least one tuple per
    /// page; `HeapFile::open` checks this.
    pub fn new(schema: Schema, page_no: usize) -> HeapPage {
        let num_slots = Self::num_slots_for(&schema);

        HeapPage {
            schema,
            page_no,
            slots: vec![None; num_slots],
            num_slots,
            num_used: 0,
            free_slots: (0..num_slots).collect(),
            dirty: false,
        }
    }

    pub fn page_no(&self) -> usize {
        self.page_no
    }

    pub fn num_slots(&self) -> usize {
        self.num_slots
    }

    pub fn num_used(&self) -> usize {
        self.num_used
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
    }

    /// Store the tuple in a free slot, set its rid and return it. The free
    /// slot stack is popped LIFO, so the most recently freed slot is reused
    /// first.
    pub fn insert(&mut self, mut tuple: Tuple) -> Result<Rid> {
        let slot_no = self.free_slots.pop().ok_or(Error::PageFull)?;
        let rid = Rid::new(self.page_no, slot_no);

        tuple.set_rid(Some(rid));
        self.slots[slot_no] = Some(tuple);
        self.num_used += 1;
        self.dirty = true;

        Ok(rid)
    }

    /// Clear the slot the rid names. Surviving tuples keep their slots
    /// until the page is next written back.
    pub fn delete(&mut self, rid: Rid) -> Result<()> {
        if rid.page_no != self.page_no {
            return Err(Error::InvalidRid(format!(
                "rid names page {} but this is page {}",
                rid.page_no, self.page_no
            )));
        }

        if rid.slot_no >= self.num_slots {
            return Err(Error::InvalidRid(format!(
                "slot {} is out of range for page {}",
                rid.slot_no, self.page_no
            )));
        }
        if self.slots[rid.slot_no].take().is_none() {
            return Err(Error::InvalidRid(format!(
                "slot {} of page {} is already empty",
                rid.slot_no, self.page_no
            )));
        }

        self.free_slots.push(rid.slot_no);
        self.num_used -= 1;
        self.dirty = true;
        Ok(())
    }

    /// Iterate the occupied slots in ascending order. Every emitted tuple
    /// carries the rid of the slot it was read from.
    pub fn iter(&self) -> HeapPageIter<'_> {
        HeapPageIter {
            page: self,
            slot_no: 0,
        }
    }

    /// The compact on-disk image of this page.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(PAGE_SIZE);
        buf.write_i32::<LittleEndian>(self.num_slots as i32)?;
        buf.write_i32::<LittleEndian>(self.num_used as i32)?;

        for tuple in self.slots.iter().flatten() {
            tuple.write_to(&mut buf)?;
        }

        buf.resize(PAGE_SIZE, 0);
        Ok(buf)
    }

    /// Rebuild a page from its on-disk image. Tuples land in slots
    /// `0..used_count` and the free stack holds the remaining indices.
    pub fn deserialize(schema: Schema, page_no: usize, data: &[u8]) -> Result<HeapPage> {
        let mut reader = data;
        let num_slots = reader.read_i32::<LittleEndian>()? as usize;
        let num_used = reader.read_i32::<LittleEndian>()? as usize;

        if num_slots != Self::num_slots_for(&schema) {
            return Err(Error::MalformedData(format!(
                "page {} holds {} slots but the schema implies {}",
                page_no,
                num_slots,
                Self::num_slots_for(&schema)
            )));
        }
        if num_used > num_slots {
            return Err(Error::MalformedData(format!(
                "page {} claims {} used slots out of {}",
                page_no, num_used, num_slots
            )));
        }

        let mut slots = vec![None; num_slots];
        for (slot_no, slot) in slots.iter_mut().enumerate().take(num_used) {
            let mut tuple = Tuple::read_from(&mut reader, &schema)?;
            tuple.set_rid(Some(Rid::new(page_no, slot_no)));
            *slot = Some(tuple);
        }

        Ok(HeapPage {
            schema,
            page_no,
            slots,
            num_slots,
            num_used,
            free_slots: (num_used..num_slots).collect(),
            dirty: false,
        })
    }
}

pub struct HeapPageIter<'a> {
    page: &'a HeapPage,
    slot_no: usize,
}

impl<'a> Iterator for HeapPageIter<'a> {
    type Item = Tuple;

    fn next(&mut self) -> Option<Tuple> {
        while self.slot_no < self.page.num_slots {
            let slot_no = self.slot_no;
            self.slot_no += 1;

            if let Some(tuple) = &self.page.slots[slot_no] {
                let mut tuple = tuple.clone();
                tuple.set_rid(Some(Rid::new(self.page.page_no, slot_no)));
                return Some(tuple);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::{Column, DataType},
        storage::Value,
    };

    fn test_schema() -> Schema {
        Schema::new(vec![
            Column::new("a", DataType::Int),
            Column::new("b", DataType::Str),
        ])
    }

    fn test_tuple(a: i64, b: &str) -> Tuple {
        Tuple::new(test_schema(), vec![Value::Int(a), Value::Str(b.to_string())]).unwrap()
    }

    #[test]
    fn serialize_then_deserialize_renumbers_tuples() {
        let mut page = HeapPage::new(test_schema(), 0);
        let first = page.insert(test_tuple(1, "x")).unwrap();
        let second = page.insert(test_tuple(2, "yy")).unwrap();

        // a fresh page hands out the highest free slot first
        assert_eq!(first.slot_no, page.num_slots() - 1);
        assert_eq!(second.slot_no, page.num_slots() - 2);

        let data = page.serialize().unwrap();
        assert_eq!(data.len(), PAGE_SIZE);

        // the disk image is compact, so the survivors come back renumbered
        // into slots 0 and 1 in ascending slot order
        let page = HeapPage::deserialize(test_schema(), 0, &data).unwrap();
        let tuples: Vec<_> = page.iter().collect();
        assert_eq!(tuples.len(), 2);
        assert_eq!(tuples[0], test_tuple(2, "yy"));
        assert_eq!(tuples[1], test_tuple(1, "x"));
        assert_eq!(tuples[0].rid(), Some(Rid::new(0, 0)));
        assert_eq!(tuples[1].rid(), Some(Rid::new(0, 1)));
    }

    #[test]
    fn insert_fails_when_page_is_full() {
        let mut page = HeapPage::new(test_schema(), 0);
        for i in 0..page.num_slots() {
            page.insert(test_tuple(i as i64, "t")).unwrap();
        }

        match page.insert(test_tuple(-1, "overflow")) {
            Err(Error::PageFull) => {}
            other => panic!("expected page full, got {:?}", other),
        }
    }

    #[test]
    fn delete_frees_the_slot_for_reuse() {
        let mut page = HeapPage::new(test_schema(), 0);
        let rid = page.insert(test_tuple(1, "x")).unwrap();
        page.insert(test_tuple(2, "y")).unwrap();

        page.delete(rid).unwrap();
        assert_eq!(page.num_used(), 1);

        // the freed slot is on top of the stack and is reused first
        let reused = page.insert(test_tuple(3, "z")).unwrap();
        assert_eq!(reused.slot_no, rid.slot_no);
    }

    #[test]
    fn delete_of_empty_or_out_of_range_slot_is_invalid() {
        let mut page = HeapPage::new(test_schema(), 0);
        let rid = page.insert(test_tuple(1, "x")).unwrap();
        page.delete(rid).unwrap();

        match page.delete(rid) {
            Err(Error::InvalidRid(_)) => {}
            other => panic!("expected invalid rid, got {:?}", other),
        }
        match page.delete(Rid::new(0, page.num_slots())) {
            Err(Error::InvalidRid(_)) => {}
            other => panic!("expected invalid rid, got {:?}", other),
        }
    }

    #[test]
    fn surviving_tuples_keep_their_slots_until_write_back() {
        let mut page = HeapPage::new(test_schema(), 0);
        let rids: Vec<_> = (0..3)
            .map(|i| page.insert(test_tuple(i, "t")).unwrap())
            .collect();

        page.delete(rids[1]).unwrap();

        let slots: Vec<_> = page.iter().map(|t| t.rid().unwrap().slot_no).collect();
        assert_eq!(
            slots,
            vec![rids[2].slot_no, rids[0].slot_no],
            "remaining tuples stay where they were"
        );
    }

    #[test]
    fn empty_page_round_trips() {
        let page = HeapPage::new(test_schema(), 5);
        let data = page.serialize().unwrap();
        let back = HeapPage::deserialize(test_schema(), 5, &data).unwrap();
        assert_eq!(back.num_used(), 0);
        assert_eq!(back.iter().count(), 0);
    }

    #[test]
    fn deserialize_rejects_wrong_slot_count() {
        let page = HeapPage::new(test_schema(), 0);
        let data = page.serialize().unwrap();

        let other_schema = Schema::new(vec![Column::new("a", DataType::Int)]);
        match HeapPage::deserialize(other_schema, 0, &data) {
            Err(Error::MalformedData(_)) => {}
            other => panic!("expected malformed data, got {:?}", other),
        }
    }
}
