use hashbrown::hash_table::HashTable;

// Maps the hash of a key to that key's position in the entry vector. Small tables store `u32`
// positions and are upgraded to `usize` positions once a position stops fitting in `u32`.
#[derive(Debug, Clone)]
pub enum PosTable {
    Small(HashTable<u32>),
    Large(HashTable<usize>),
}

#[derive(Debug)]
pub enum OccupiedEntry<'a> {
    Small(hashbrown::hash_table::OccupiedEntry<'a, u32>),
    Large(hashbrown::hash_table::OccupiedEntry<'a, usize>),
}

#[derive(Debug)]
pub enum VacantEntry<'a> {
    Small(hashbrown::hash_table::VacantEntry<'a, u32>),
    Large(hashbrown::hash_table::VacantEntry<'a, usize>),
}

#[derive(Debug)]
pub enum Entry<'a> {
    Occupied(OccupiedEntry<'a>),
    Vacant(VacantEntry<'a>),
}

impl Default for PosTable {
    fn default() -> Self {
        PosTable::Small(HashTable::new())
    }
}

impl PosTable {
    pub fn with_capacity(capacity: usize) -> Self {
        if Self::try_as_small(capacity).is_ok() {
            PosTable::Small(HashTable::with_capacity(capacity))
        } else {
            PosTable::Large(HashTable::with_capacity(capacity))
        }
    }
    #[inline(always)]
    fn as_small(pos: usize) -> u32 {
        Self::try_as_small(pos).unwrap()
    }
    #[inline(always)]
    fn try_as_small(pos: usize) -> Result<u32, std::num::TryFromIntError> {
        u32::try_from(pos)
    }
    #[inline(always)]
    pub fn len(&self) -> usize {
        match self {
            PosTable::Small(table) => table.len(),
            PosTable::Large(table) => table.len(),
        }
    }
    #[inline(always)]
    pub fn clear(&mut self) {
        match self {
            PosTable::Small(table) => table.clear(),
            PosTable::Large(table) => table.clear(),
        }
    }
    #[inline(always)]
    pub fn find(&self, hash: u64, mut eq: impl FnMut(usize) -> bool) -> Option<usize> {
        match self {
            PosTable::Small(table) => {
                table.find(hash, |&pos| eq(pos as usize)).map(|&pos| pos as usize)
            }
            PosTable::Large(table) => table.find(hash, |&pos| eq(pos)).copied(),
        }
    }
    #[inline(always)]
    pub fn find_entry(
        &mut self,
        hash: u64,
        mut eq: impl FnMut(usize) -> bool,
    ) -> Option<OccupiedEntry<'_>> {
        match self {
            PosTable::Small(table) => table
                .find_entry(hash, |&pos| eq(pos as usize))
                .ok()
                .map(OccupiedEntry::Small),
            PosTable::Large(table) => {
                table.find_entry(hash, |&pos| eq(pos)).ok().map(OccupiedEntry::Large)
            }
        }
    }
    #[inline(always)]
    pub fn entry(
        &mut self,
        hash: u64,
        mut eq: impl FnMut(usize) -> bool,
        hasher: impl Fn(usize) -> u64,
    ) -> Entry<'_> {
        match self {
            PosTable::Small(table) => {
                match table.entry(hash, |&pos| eq(pos as usize), |&pos| hasher(pos as usize)) {
                    hashbrown::hash_table::Entry::Occupied(entry) => {
                        Entry::Occupied(OccupiedEntry::Small(entry))
                    }
                    hashbrown::hash_table::Entry::Vacant(entry) => {
                        Entry::Vacant(VacantEntry::Small(entry))
                    }
                }
            }
            PosTable::Large(table) => {
                match table.entry(hash, |&pos| eq(pos), |&pos| hasher(pos)) {
                    hashbrown::hash_table::Entry::Occupied(entry) => {
                        Entry::Occupied(OccupiedEntry::Large(entry))
                    }
                    hashbrown::hash_table::Entry::Vacant(entry) => {
                        Entry::Vacant(VacantEntry::Large(entry))
                    }
                }
            }
        }
    }
    // Callers must have ruled out an equal key and called `grow_for(pos)` beforehand.
    #[inline(always)]
    pub fn insert_unique(&mut self, hash: u64, pos: usize, hasher: impl Fn(usize) -> u64) {
        match self {
            PosTable::Small(table) => {
                table.insert_unique(hash, Self::as_small(pos), |&pos| hasher(pos as usize));
            }
            PosTable::Large(table) => {
                table.insert_unique(hash, pos, |&pos| hasher(pos));
            }
        }
    }
    // Rewrites stored positions in place. The table never rehashes here since hashes derive
    // from the keys, not from the stored positions.
    fn retain(&mut self, mut f: impl FnMut(usize) -> Option<usize>) {
        match self {
            PosTable::Small(table) => table.retain(|pos| match f(*pos as usize) {
                Some(new_pos) => {
                    *pos = Self::as_small(new_pos);
                    true
                }
                None => false,
            }),
            PosTable::Large(table) => table.retain(|pos| match f(*pos) {
                Some(new_pos) => {
                    *pos = new_pos;
                    true
                }
                None => false,
            }),
        }
    }
    // Drops the entry stored at position `at` and shifts every later position down by one,
    // mirroring a `Vec::remove` on the entry vector.
    pub fn remove_shift(&mut self, at: usize) {
        self.retain(|pos| {
            if pos < at {
                Some(pos)
            } else if pos == at {
                None
            } else {
                Some(pos - 1)
            }
        });
    }
    // Shifts every position at or after `at` up by one, mirroring a `Vec::insert` on the entry
    // vector. The caller inserts the entry for the freed position afterwards.
    pub fn open_gap(&mut self, at: usize) {
        self.retain(|pos| Some(if pos >= at { pos + 1 } else { pos }));
    }
    #[inline(always)]
    pub fn is_small(&self) -> bool {
        match self {
            PosTable::Small(_) => true,
            PosTable::Large(_) => false,
        }
    }
    #[inline(always)]
    pub fn grow_for(&mut self, pos: usize, hasher: impl Fn(usize) -> u64) {
        if Self::try_as_small(pos).is_err() && self.is_small() {
            self.grow_cold(hasher)
        }
    }
    #[inline(never)]
    #[cold]
    fn grow_cold(&mut self, hasher: impl Fn(usize) -> u64) {
        let PosTable::Small(old_table) = std::mem::replace(self, PosTable::Large(HashTable::new()))
        else {
            unreachable!()
        };
        let PosTable::Large(new_table) = self else {
            unreachable!()
        };
        new_table.reserve(old_table.len(), |&pos| hasher(pos));
        for pos in old_table {
            new_table.insert_unique(hasher(pos as usize), pos as usize, |&other| hasher(other));
        }
    }
    #[inline(always)]
    pub fn reserve(&mut self, additional: usize, hasher: impl Fn(usize) -> u64) {
        self.grow_for((self.len() + additional).saturating_sub(1), &hasher);
        match self {
            PosTable::Small(table) => table.reserve(additional, |&pos| hasher(pos as usize)),
            PosTable::Large(table) => table.reserve(additional, |&pos| hasher(pos)),
        }
    }
}

impl VacantEntry<'_> {
    #[inline(always)]
    pub fn insert(self, pos: usize) {
        match self {
            VacantEntry::Small(entry) => {
                entry.insert(PosTable::as_small(pos));
            }
            VacantEntry::Large(entry) => {
                entry.insert(pos);
            }
        }
    }
}

impl OccupiedEntry<'_> {
    #[inline(always)]
    pub fn get(&self) -> usize {
        match self {
            OccupiedEntry::Small(entry) => *entry.get() as usize,
            OccupiedEntry::Large(entry) => *entry.get(),
        }
    }
    #[inline(always)]
    pub fn remove(self) -> usize {
        match self {
            OccupiedEntry::Small(entry) => entry.remove().0 as usize,
            OccupiedEntry::Large(entry) => entry.remove().0,
        }
    }
}
